//! The example pipeline: provision a bucket, then copy a CSV file into it

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use extract_core::constants::EXAMPLE_DAG_ID;
use extract_core::{PipelineParams, RetryPolicy};

use crate::dag::Dag;
use crate::error::DagError;
use crate::tasks::{CreateBucketTask, DownloadToStorageTask};

const DESCRIPTION: &str = "\
Example DAG

A very simple pipeline used to extract a CSV file (Rotten Tomato ratings of movies with \
Robert De Niro) from a public server and save it on an S3 bucket.

Data source: [here](https://people.sc.fsu.edu/~jburkardt/data/data.html)
";

/// Build `create_bucket >> download_to_s3`, manually triggered, starting 2024-06-09.
pub fn example_dag(params: PipelineParams, retry: RetryPolicy) -> Result<Dag, DagError> {
    let start_date = utc_midnight(2024, 6, 9)?;

    let mut dag = Dag::new(EXAMPLE_DAG_ID, start_date)
        .with_description(DESCRIPTION)
        .with_schedule(None)
        .with_params(params)
        .with_default_args(retry);

    dag.add_task(Arc::new(CreateBucketTask::new()))?;
    dag.add_task(Arc::new(
        DownloadToStorageTask::new().bucket_from(CreateBucketTask::DEFAULT_ID),
    ))?;
    dag.set_downstream(CreateBucketTask::DEFAULT_ID, DownloadToStorageTask::DEFAULT_ID)?;
    dag.validate()?;

    Ok(dag)
}

/// Midnight UTC on the given calendar day.
fn utc_midnight(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>, DagError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
        .ok_or_else(|| DagError::InvalidStartDate(format!("{:04}-{:02}-{:02}", year, month, day)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_date_rejects_impossible_days() {
        assert_eq!(
            utc_midnight(2024, 2, 30),
            Err(DagError::InvalidStartDate("2024-02-30".to_string()))
        );
        assert_eq!(
            utc_midnight(2024, 6, 9).unwrap().to_rfc3339(),
            "2024-06-09T00:00:00+00:00"
        );
    }

    #[test]
    fn wires_create_bucket_before_download() {
        let dag = example_dag(PipelineParams::default(), RetryPolicy::default()).unwrap();

        assert_eq!(dag.dag_id(), "example_dag");
        assert!(dag.schedule().is_none());
        assert_eq!(
            dag.topological_order().unwrap(),
            vec!["create_bucket", "download_to_s3"]
        );
        assert_eq!(
            dag.upstream_of("download_to_s3").unwrap(),
            vec!["create_bucket"]
        );
        assert_eq!(dag.start_date().to_rfc3339(), "2024-06-09T00:00:00+00:00");
    }

    #[test]
    fn carries_params_and_retry_policy() {
        let dag = example_dag(PipelineParams::default(), RetryPolicy::default()).unwrap();

        assert_eq!(dag.params().s3_bucket, "test-bucket");
        assert_eq!(dag.params().region, "eu-central-1");
        assert!(dag.params().url.ends_with("/deniro.csv"));
        assert_eq!(dag.default_args().retries, 3);
        assert_eq!(dag.default_args().retry_delay().as_secs(), 300);
        assert!(dag.description().unwrap().starts_with("Example DAG"));
    }
}
