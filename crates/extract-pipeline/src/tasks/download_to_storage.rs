use async_trait::async_trait;
use extract_core::TaskError;
use serde_json::Value;

use crate::task::{Task, TaskContext, TaskOutputs};
use crate::transfer::transfer;

/// Copies the run's source URL into storage. Outputs the object locator as a string.
///
/// The destination bucket is the output of the upstream task named by `bucket_from`, or
/// the run's `s3_bucket` parameter when no upstream is configured.
#[derive(Debug, Clone)]
pub struct DownloadToStorageTask {
    task_id: String,
    bucket_from: Option<String>,
}

impl DownloadToStorageTask {
    pub const DEFAULT_ID: &'static str = "download_to_s3";

    pub fn new() -> Self {
        Self::with_id(Self::DEFAULT_ID)
    }

    pub fn with_id(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            bucket_from: None,
        }
    }

    /// Take the destination bucket from the output of `upstream_task_id`.
    pub fn bucket_from(mut self, upstream_task_id: impl Into<String>) -> Self {
        self.bucket_from = Some(upstream_task_id.into());
        self
    }
}

impl Default for DownloadToStorageTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Task for DownloadToStorageTask {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn execute(&self, ctx: &TaskContext, upstream: &TaskOutputs) -> Result<Value, TaskError> {
        let bucket: String = match &self.bucket_from {
            Some(task_id) => upstream.pull(task_id)?,
            None => ctx.params.s3_bucket.clone(),
        };

        let locator = transfer(ctx.storage.as_ref(), &ctx.http, &ctx.params.url, &bucket).await?;

        Ok(Value::String(locator.to_string()))
    }
}
