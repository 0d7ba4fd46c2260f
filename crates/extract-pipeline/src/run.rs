//! Local graph runner
//!
//! Runs every task of a [`Dag`] once, sequentially, in topological order. Nothing is
//! retried and nothing is persisted: the returned [`DagRunReport`] is the whole record of
//! the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use extract_core::RetryPolicy;
use extract_storage::ObjectStorage;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::dag::Dag;
use crate::error::DagError;
use crate::task::{TaskContext, TaskOutputs};

/// Final state of a task within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Success,
    Failed,
    /// Not run because an upstream task failed or was itself skipped.
    UpstreamFailed,
}

/// Final state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Success,
    Failed,
}

/// Outcome of one task
#[derive(Debug, Clone, Serialize)]
pub struct TaskRunRecord {
    pub task_id: String,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Advisory hint for an orchestrator; only set for failed tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recoverable: Option<bool>,
    pub duration_ms: u64,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct DagRunReport {
    pub run_id: Uuid,
    pub dag_id: String,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Policy an orchestrator would apply to failed tasks. Not applied by this runner.
    pub retry_policy: RetryPolicy,
    /// Tasks in execution order.
    pub tasks: Vec<TaskRunRecord>,
}

impl DagRunReport {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Success
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskRunRecord> {
        self.tasks.iter().find(|record| record.task_id == task_id)
    }

    pub fn output(&self, task_id: &str) -> Option<&Value> {
        self.task(task_id).and_then(|record| record.output.as_ref())
    }
}

/// One execution of a graph
pub struct DagRun<'a> {
    dag: &'a Dag,
    ctx: TaskContext,
}

impl<'a> DagRun<'a> {
    pub fn new(dag: &'a Dag, ctx: TaskContext) -> Self {
        Self { dag, ctx }
    }

    /// A run using the graph's own parameters.
    pub fn with_dag_params(dag: &'a Dag, storage: Arc<dyn ObjectStorage>, http: Client) -> Self {
        let ctx = TaskContext::new(dag.dag_id(), dag.params().clone(), storage, http);
        Self::new(dag, ctx)
    }

    pub fn run_id(&self) -> Uuid {
        self.ctx.run_id
    }

    /// Execute every task once.
    ///
    /// Task failures are recorded in the report, not returned as errors. Only a graph that
    /// cannot be ordered fails the call itself.
    pub async fn execute(&self) -> Result<DagRunReport, DagError> {
        let order = self.dag.topological_order()?;
        let started_at = Utc::now();

        tracing::info!(
            dag_id = %self.dag.dag_id(),
            run_id = %self.ctx.run_id,
            tasks = order.len(),
            "Starting DAG run"
        );

        let mut outputs = TaskOutputs::new();
        let mut records: Vec<TaskRunRecord> = Vec::with_capacity(order.len());

        for task_id in order {
            let task = self
                .dag
                .task(&task_id)
                .ok_or_else(|| DagError::UnknownTask(task_id.clone()))?;

            let upstream = self.dag.upstream_of(&task_id)?;
            let blocked = upstream.iter().any(|up| {
                records
                    .iter()
                    .any(|r| &r.task_id == up && r.state != TaskState::Success)
            });

            if blocked {
                tracing::warn!(task_id = %task_id, "Skipping task, upstream failed");
                records.push(TaskRunRecord {
                    task_id,
                    state: TaskState::UpstreamFailed,
                    output: None,
                    error: None,
                    recoverable: None,
                    duration_ms: 0,
                });
                continue;
            }

            tracing::info!(task_id = %task_id, run_id = %self.ctx.run_id, "Running task");
            let start = std::time::Instant::now();
            let result = task.execute(&self.ctx, &outputs).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(value) => {
                    tracing::info!(
                        task_id = %task_id,
                        duration_ms = duration_ms,
                        output = %value,
                        "Task succeeded"
                    );
                    outputs.insert(task_id.clone(), value.clone());
                    records.push(TaskRunRecord {
                        task_id,
                        state: TaskState::Success,
                        output: Some(value),
                        error: None,
                        recoverable: None,
                        duration_ms,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        task_id = %task_id,
                        duration_ms = duration_ms,
                        recoverable = e.is_recoverable(),
                        error = %e.chain_message(),
                        "Task failed"
                    );
                    records.push(TaskRunRecord {
                        task_id,
                        state: TaskState::Failed,
                        output: None,
                        error: Some(e.chain_message()),
                        recoverable: Some(e.is_recoverable()),
                        duration_ms,
                    });
                }
            }
        }

        let state = if records.iter().all(|r| r.state == TaskState::Success) {
            RunState::Success
        } else {
            RunState::Failed
        };

        tracing::info!(
            dag_id = %self.dag.dag_id(),
            run_id = %self.ctx.run_id,
            state = ?state,
            "DAG run finished"
        );

        Ok(DagRunReport {
            run_id: self.ctx.run_id,
            dag_id: self.dag.dag_id().to_string(),
            state,
            started_at,
            finished_at: Utc::now(),
            retry_policy: self.dag.default_args(),
            tasks: records,
        })
    }
}
