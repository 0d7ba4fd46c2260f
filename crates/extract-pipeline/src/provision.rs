//! Bucket provisioning

use extract_storage::{ObjectStorage, StorageError, StorageResult};

/// Make sure `bucket` exists, creating it in `region` when it does not.
///
/// Returns the bucket name unchanged whether or not a bucket was created. An existing
/// bucket gets no mutating call. A create that reports the bucket as already owned by the
/// caller (a concurrent run won the race) counts as success.
pub async fn ensure_bucket(
    storage: &dyn ObjectStorage,
    bucket: &str,
    region: &str,
) -> StorageResult<String> {
    tracing::info!(bucket = %bucket, "Checking if bucket exists");

    if storage.bucket_exists(bucket).await? {
        tracing::info!(bucket = %bucket, "Bucket already exists");
        return Ok(bucket.to_string());
    }

    tracing::info!(bucket = %bucket, "Bucket does not exist, creating");

    match storage.create_bucket(bucket, region).await {
        Ok(()) => {
            tracing::info!(bucket = %bucket, region = %region, "Created bucket");
        }
        Err(StorageError::BucketAlreadyOwned(_)) => {
            tracing::info!(
                bucket = %bucket,
                region = %region,
                "Bucket was created concurrently and is owned by us"
            );
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                region = %region,
                "Failed to create bucket"
            );
            return Err(e);
        }
    }

    Ok(bucket.to_string())
}
