//! Task trait and the context tasks run in

use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use extract_core::{PipelineParams, TaskError, TaskResultExt};
use extract_storage::ObjectStorage;
use indexmap::IndexMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// One step of a task graph.
///
/// A task runs once per graph run and either returns a JSON value, which downstream tasks
/// can read through [`TaskOutputs`], or fails.
#[async_trait]
pub trait Task: Send + Sync {
    /// Identifier, unique within a graph.
    fn task_id(&self) -> &str;

    /// Run the task. `upstream` holds the outputs of every task that finished before it.
    async fn execute(&self, ctx: &TaskContext, upstream: &TaskOutputs) -> Result<Value, TaskError>;
}

/// Everything a task needs from its environment.
#[derive(Clone)]
pub struct TaskContext {
    pub run_id: Uuid,
    pub dag_id: String,
    pub params: PipelineParams,
    pub storage: Arc<dyn ObjectStorage>,
    pub http: Client,
}

impl TaskContext {
    pub fn new(
        dag_id: impl Into<String>,
        params: PipelineParams,
        storage: Arc<dyn ObjectStorage>,
        http: Client,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            dag_id: dag_id.into(),
            params,
            storage,
            http,
        }
    }
}

/// Return values of finished tasks, keyed by task id, in completion order.
#[derive(Debug, Clone, Default)]
pub struct TaskOutputs {
    values: IndexMap<String, Value>,
}

impl TaskOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task_id: impl Into<String>, value: Value) {
        self.values.insert(task_id.into(), value);
    }

    pub fn get(&self, task_id: &str) -> Option<&Value> {
        self.values.get(task_id)
    }

    /// Read and deserialize the output of `task_id`.
    ///
    /// A missing or mistyped output is a wiring mistake, so the error is unrecoverable.
    pub fn pull<T: DeserializeOwned>(&self, task_id: &str) -> Result<T, TaskError> {
        let value = self
            .values
            .get(task_id)
            .ok_or_else(|| anyhow!("No output from upstream task {}", task_id))
            .unrecoverable()?;

        serde_json::from_value::<T>(value.clone())
            .with_context(|| format!("Output of upstream task {} has an unexpected shape", task_id))
            .unrecoverable()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pull_typed_output() {
        let mut outputs = TaskOutputs::new();
        outputs.insert("create_bucket", json!("test-bucket"));

        let bucket: String = outputs.pull("create_bucket").unwrap();
        assert_eq!(bucket, "test-bucket");
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn pull_missing_or_mistyped_is_unrecoverable() {
        let mut outputs = TaskOutputs::new();
        outputs.insert("count", json!({"n": 1}));

        let missing = outputs.pull::<String>("create_bucket").unwrap_err();
        assert!(!missing.is_recoverable());

        let mistyped = outputs.pull::<String>("count").unwrap_err();
        assert!(!mistyped.is_recoverable());
        assert!(mistyped
            .chain_message()
            .starts_with("Output of upstream task count has an unexpected shape: "));
    }
}
