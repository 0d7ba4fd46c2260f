//! Task failure type
//!
//! Tasks never retry on their own. When a task fails, the error carries a hint telling an
//! external orchestrator whether re-running the task can plausibly succeed. The local DAG
//! runner only records the hint.

use std::fmt;

/// Error returned by a pipeline task.
#[derive(Debug)]
pub struct TaskError {
    inner: anyhow::Error,
    recoverable: bool,
}

impl TaskError {
    /// A failure that will repeat on every attempt (bad input, missing permissions,
    /// a source that answers 404).
    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            recoverable: false,
        }
    }

    /// Build an error whose recoverability is decided by the caller.
    pub fn with_recoverability(err: impl Into<anyhow::Error>, recoverable: bool) -> Self {
        Self {
            inner: err.into(),
            recoverable,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    /// Full error chain rendered on one line, for run reports.
    pub fn chain_message(&self) -> String {
        format!("{:#}", self.inner)
    }
}

/// Whether an HTTP status returned by a source is worth retrying.
///
/// Server errors, request timeouts and throttling are transient; every other client
/// error will fail again with the same input.
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Extension trait to mark a `Result` as an unrecoverable task failure.
pub trait TaskResultExt<T> {
    fn unrecoverable(self) -> Result<T, TaskError>;
}

impl<T, E: Into<anyhow::Error>> TaskResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> Result<T, TaskError> {
        self.map_err(|e| TaskError::unrecoverable(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn result_ext_marks_unrecoverable() {
        let result: Result<(), anyhow::Error> = Err(anyhow::anyhow!("bucket name rejected"));
        let err = result.unrecoverable().unwrap_err();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("bucket name rejected"));
    }

    #[test]
    fn chain_message_includes_context() {
        let result: Result<(), anyhow::Error> = Err(anyhow::anyhow!("403 Forbidden"));
        let err = TaskError::unrecoverable(result.context("create bucket").unwrap_err());
        assert_eq!(err.chain_message(), "create bucket: 403 Forbidden");
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(408));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(403));
    }
}
