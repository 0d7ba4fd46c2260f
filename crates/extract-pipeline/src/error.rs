//! Pipeline error types

use extract_core::task_error::is_retryable_status;
use extract_core::{ModelError, TaskError};
use extract_storage::StorageError;
use thiserror::Error;

/// Failure while copying a remote file into object storage
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    InvalidUrl(#[from] ModelError),

    #[error("Source {url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TransferError {
    /// Whether running the transfer again unchanged can succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransferError::InvalidUrl(_) => false,
            TransferError::Status { status, .. } => is_retryable_status(*status),
            TransferError::Request { source, .. } => !source.is_builder(),
            TransferError::Storage(e) => e.is_recoverable(),
        }
    }
}

impl From<TransferError> for TaskError {
    fn from(err: TransferError) -> Self {
        let recoverable = err.is_recoverable();
        TaskError::with_recoverability(err, recoverable)
    }
}

/// Invalid task graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DagError {
    #[error("Task {0} is already part of the graph")]
    DuplicateTask(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task {0} cannot depend on itself")]
    SelfDependency(String),

    #[error("Edge {upstream} >> {downstream} would create a cycle")]
    Cycle { upstream: String, downstream: String },

    #[error("Graph contains a cycle through task {0}")]
    CycleDetected(String),

    #[error("Invalid start date: {0}")]
    InvalidStartDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_recoverability() {
        let not_found = TransferError::Status {
            url: "http://example.com/a.csv".into(),
            status: 404,
        };
        let unavailable = TransferError::Status {
            url: "http://example.com/a.csv".into(),
            status: 503,
        };
        assert!(!not_found.is_recoverable());
        assert!(unavailable.is_recoverable());

        let task_error: TaskError = not_found.into();
        assert!(!task_error.is_recoverable());
        assert!(task_error.to_string().contains("HTTP 404"));
    }

    #[test]
    fn invalid_url_is_unrecoverable() {
        let err = TransferError::from(ModelError::MissingFileName("http://example.com/".into()));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn storage_errors_keep_their_classification() {
        assert!(TransferError::from(StorageError::BackendError("timeout".into())).is_recoverable());
        assert!(!TransferError::from(StorageError::AccessDenied("403".into())).is_recoverable());
    }
}
