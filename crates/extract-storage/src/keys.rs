//! Shared object key checks for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Longest key S3 accepts, in bytes.
pub const MAX_KEY_LENGTH: usize = 1024;

/// Validate an object key.
///
/// Keys are `/`-separated paths: no leading `/`, no empty segments, no `.` or `..`
/// segments, no backslashes. The filesystem backend maps segments to directories, so these
/// rules also keep objects inside their bucket directory.
pub fn validate_object_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Object key is empty".to_string()));
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(StorageError::InvalidKey(format!(
            "Object key exceeds {} bytes",
            MAX_KEY_LENGTH
        )));
    }

    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Object key contains invalid characters: {}",
            key
        )));
    }

    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Object key contains an empty or relative path segment: {}",
            key
        )));
    }

    Ok(())
}

/// Validate a bucket name with the shared S3 naming rules.
pub fn validate_bucket(bucket: &str) -> StorageResult<()> {
    extract_core::validation::validate_bucket_name(bucket)
        .map_err(|e| StorageError::InvalidBucket(e.to_string()))
}
