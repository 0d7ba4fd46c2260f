//! Extract Pipeline Library
//!
//! The two pipeline steps and the graph that orders them:
//! - [`ensure_bucket`]: create a bucket unless it already exists
//! - [`transfer`]: stream a remote file into a bucket under `extract/<file name>`
//! - [`CreateBucketTask`] and [`DownloadToStorageTask`]: the steps as graph tasks
//! - [`Dag`] and [`DagRun`]: the task graph and a runner that executes it once, in order
//!
//! [`example_dag`] wires the two tasks as `create_bucket >> download_to_s3`.

pub mod dag;
pub mod error;
pub mod example;
pub mod provision;
pub mod run;
pub mod task;
pub mod tasks;
pub mod transfer;

// Re-export commonly used types
pub use dag::Dag;
pub use error::{DagError, TransferError};
pub use example::example_dag;
pub use provision::ensure_bucket;
pub use run::{DagRun, DagRunReport, RunState, TaskRunRecord, TaskState};
pub use task::{Task, TaskContext, TaskOutputs};
pub use tasks::{CreateBucketTask, DownloadToStorageTask};
pub use transfer::transfer;
