//! Per-run pipeline parameters and the declarative retry policy

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BUCKET, DEFAULT_REGION, DEFAULT_SOURCE_URL};

/// Parameters supplied once per pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Source file to copy.
    pub url: String,
    /// Destination bucket.
    pub s3_bucket: String,
    /// Region the bucket is created in when it does not exist yet.
    pub region: String,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            s3_bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl PipelineParams {
    /// Replace the fields for which an override is given.
    pub fn with_overrides(
        mut self,
        url: Option<String>,
        s3_bucket: Option<String>,
        region: Option<String>,
    ) -> Self {
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(bucket) = s3_bucket {
            self.s3_bucket = bucket;
        }
        if let Some(region) = region {
            self.region = region;
        }
        self
    }
}

/// Retry policy attached to every task of a graph.
///
/// Interpreted by an external orchestrator; nothing in this workspace re-runs a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl RetryPolicy {
    pub const DEFAULT_RETRIES: u32 = 3;
    pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5 * 60;

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: Self::DEFAULT_RETRIES,
            retry_delay_secs: Self::DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_example_run() {
        let params = PipelineParams::default();
        assert!(params.url.ends_with("/deniro.csv"));
        assert_eq!(params.s3_bucket, "test-bucket");
        assert_eq!(params.region, "eu-central-1");
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let params = PipelineParams::default().with_overrides(
            None,
            Some("other-bucket".to_string()),
            None,
        );
        assert_eq!(params.s3_bucket, "other-bucket");
        assert_eq!(params.region, "eu-central-1");
    }

    #[test]
    fn default_retry_policy_is_three_times_five_minutes() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.retry_delay(), Duration::from_secs(300));
    }
}
