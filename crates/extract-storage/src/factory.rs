#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::{S3Settings, S3Storage};
use crate::{ObjectStorage, StorageBackend, StorageError, StorageResult};
use extract_core::StorageConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
///
/// `region` is the client region for S3; the filesystem backend ignores it.
pub async fn create_storage(
    config: &StorageConfig,
    region: &str,
) -> StorageResult<Arc<dyn ObjectStorage>> {
    match config.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            if region.trim().is_empty() {
                return Err(StorageError::ConfigError(
                    "S3_REGION or AWS_REGION not configured".to_string(),
                ));
            }

            let storage = S3Storage::new(S3Settings {
                region: region.to_string(),
                endpoint_url: config.s3_endpoint.clone(),
                credentials: config.credentials.clone(),
            })
            .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
