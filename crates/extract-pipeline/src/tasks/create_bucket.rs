use async_trait::async_trait;
use extract_core::TaskError;
use serde_json::Value;

use crate::provision::ensure_bucket;
use crate::task::{Task, TaskContext, TaskOutputs};

/// Ensures the run's bucket exists. Outputs the bucket name.
#[derive(Debug, Clone)]
pub struct CreateBucketTask {
    task_id: String,
}

impl CreateBucketTask {
    pub const DEFAULT_ID: &'static str = "create_bucket";

    pub fn new() -> Self {
        Self::with_id(Self::DEFAULT_ID)
    }

    pub fn with_id(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }
}

impl Default for CreateBucketTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Task for CreateBucketTask {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn execute(&self, ctx: &TaskContext, _upstream: &TaskOutputs) -> Result<Value, TaskError> {
        let bucket = ensure_bucket(
            ctx.storage.as_ref(),
            &ctx.params.s3_bucket,
            &ctx.params.region,
        )
        .await
        .map_err(|e| {
            let recoverable = e.is_recoverable();
            TaskError::with_recoverability(e, recoverable)
        })?;

        Ok(Value::String(bucket))
    }
}
