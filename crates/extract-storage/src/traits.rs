//! Storage abstraction trait
//!
//! This module defines the ObjectStorage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use extract_core::ObjectLocator;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket does not exist: {0}")]
    NoSuchBucket(String),

    #[error("Bucket already exists and is owned by you: {0}")]
    BucketAlreadyOwned(String),

    #[error("Bucket name is already taken by another account: {0}")]
    BucketAlreadyExists(String),

    #[error("Object already exists: {0}")]
    ObjectExists(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Invalid bucket name: {0}")]
    InvalidBucket(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether the same call can succeed when attempted again unchanged.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            StorageError::BucketAlreadyExists(_)
                | StorageError::ObjectExists(_)
                | StorageError::AccessDenied(_)
                | StorageError::InvalidKey(_)
                | StorageError::InvalidBucket(_)
                | StorageError::ConfigError(_)
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte source consumed by streaming uploads.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Options for a streaming object write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: Option<String>,
    /// Expected size, when the source announced one. Informational only.
    pub content_length: Option<u64>,
    /// Overwrite an existing object. When false, an existing object fails the write with
    /// [`StorageError::ObjectExists`].
    pub replace: bool,
}

impl PutOptions {
    /// Options for a write that overwrites any existing object.
    pub fn replace() -> Self {
        Self {
            replace: true,
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }
}

/// Storage abstraction trait
///
/// The pipeline tasks only need bucket provisioning and streaming writes; the read-side
/// methods exist for verification (tests, `check-key`).
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Check whether a bucket exists and is reachable with the current credentials.
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool>;

    /// Create a bucket in `region`.
    ///
    /// Fails with [`StorageError::BucketAlreadyOwned`] when the caller already owns a bucket
    /// with that name and [`StorageError::BucketAlreadyExists`] when someone else does.
    async fn create_bucket(&self, bucket: &str, region: &str) -> StorageResult<()>;

    /// Write an object from a reader without holding the whole payload in memory.
    ///
    /// The reader is consumed until EOF. Either the complete object becomes visible or
    /// nothing does: a failed write leaves any previous object at `key` untouched.
    ///
    /// # Returns
    /// The number of bytes written.
    async fn put_object_stream(
        &self,
        bucket: &str,
        key: &str,
        reader: ObjectReader,
        options: PutOptions,
    ) -> StorageResult<u64>;

    /// Check if an object exists
    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// Read a whole object into memory
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// List object keys starting with `prefix`, sorted.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>>;

    /// Locator of an object stored by this backend.
    fn locator(&self, bucket: &str, key: &str) -> ObjectLocator {
        ObjectLocator::new(self.backend_type().scheme(), bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_options() {
        let options = PutOptions::replace()
            .with_content_type("text/csv")
            .with_content_length(Some(42));
        assert!(options.replace);
        assert_eq!(options.content_type.as_deref(), Some("text/csv"));
        assert_eq!(options.content_length, Some(42));
        assert!(!PutOptions::default().replace);
    }

    #[test]
    fn recoverability() {
        assert!(StorageError::BackendError("503 Slow Down".into()).is_recoverable());
        assert!(StorageError::NoSuchBucket("b".into()).is_recoverable());
        assert!(!StorageError::AccessDenied("403".into()).is_recoverable());
        assert!(!StorageError::BucketAlreadyExists("b".into()).is_recoverable());
    }
}
