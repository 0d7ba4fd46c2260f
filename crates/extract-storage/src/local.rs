use crate::keys::{validate_bucket, validate_object_key};
use crate::traits::{ObjectReader, ObjectStorage, PutOptions, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Directory under the base path holding in-flight uploads.
const STAGING_DIR: &str = ".staging";

/// Local filesystem storage implementation
///
/// Buckets are directories directly under the base path. Uploads are written to a
/// staging file first and renamed into place once the reader hits EOF, so readers never
/// observe a partial object.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for buckets (e.g., "/var/lib/extract/storage")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(base_path.join(STAGING_DIR))
            .await
            .map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    base_path.display(),
                    e
                ))
            })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn bucket_path(&self, bucket: &str) -> StorageResult<PathBuf> {
        validate_bucket(bucket)?;
        Ok(self.base_path.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_object_key(key)?;
        let mut path = self.bucket_path(bucket)?;
        path.extend(key.split('/'));
        Ok(path)
    }

    async fn is_dir(path: &Path) -> StorageResult<bool> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    /// Copy the reader into a fresh staging file, returning its path and the bytes written.
    async fn stage(&self, mut reader: ObjectReader) -> StorageResult<(PathBuf, u64)> {
        let staging_path = self
            .base_path
            .join(STAGING_DIR)
            .join(format!("{}.part", Uuid::new_v4()));

        let result = async {
            let mut file = fs::File::create(&staging_path).await?;
            let size = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<u64, std::io::Error>(size)
        }
        .await;

        match result {
            Ok(size) => Ok((staging_path, size)),
            Err(e) => {
                discard(&staging_path).await;
                Err(StorageError::UploadFailed(format!(
                    "Failed to write staging file {}: {}",
                    staging_path.display(),
                    e
                )))
            }
        }
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to remove staging file"
            );
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        let path = self.bucket_path(bucket)?;
        Self::is_dir(&path).await
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> StorageResult<()> {
        let path = self.bucket_path(bucket)?;

        match fs::create_dir(&path).await {
            Ok(()) => {
                tracing::info!(
                    bucket = %bucket,
                    region = %region,
                    path = %path.display(),
                    "Local bucket created"
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::BucketAlreadyOwned(bucket.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn put_object_stream(
        &self,
        bucket: &str,
        key: &str,
        reader: ObjectReader,
        options: PutOptions,
    ) -> StorageResult<u64> {
        let path = self.object_path(bucket, key)?;
        let start = std::time::Instant::now();

        if !self.bucket_exists(bucket).await? {
            return Err(StorageError::NoSuchBucket(bucket.to_string()));
        }

        if !options.replace && fs::try_exists(&path).await? {
            return Err(StorageError::ObjectExists(format!("{}/{}", bucket, key)));
        }

        let (staging_path, size) = match self.stage(reader).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage upload failed"
                );
                return Err(e);
            }
        };

        let commit = async {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::rename(&staging_path, &path).await
        }
        .await;

        if let Err(e) = commit {
            discard(&staging_path).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to move object into place at {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(size)
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let path = self.object_path(bucket, key)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{}/{}", bucket, key)))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let root = self.bucket_path(bucket)?;
        if !Self::is_dir(&root).await? {
            return Err(StorageError::NoSuchBucket(bucket.to_string()));
        }

        let mut keys = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::{AsyncRead, ReadBuf};

    /// Yields some bytes and then fails, like a dropped HTTP connection.
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.sent {
                Poll::Ready(Err(std::io::Error::new(
                    ErrorKind::ConnectionReset,
                    "connection reset",
                )))
            } else {
                self.sent = true;
                buf.put_slice(b"year,score,title\n");
                Poll::Ready(Ok(()))
            }
        }
    }

    fn reader(data: &'static [u8]) -> ObjectReader {
        Box::pin(data)
    }

    async fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn create_bucket_then_exists() {
        let (_dir, storage) = storage().await;

        assert!(!storage.bucket_exists("test-bucket").await.unwrap());
        storage
            .create_bucket("test-bucket", "eu-central-1")
            .await
            .unwrap();
        assert!(storage.bucket_exists("test-bucket").await.unwrap());

        let second = storage.create_bucket("test-bucket", "eu-central-1").await;
        assert!(matches!(second, Err(StorageError::BucketAlreadyOwned(_))));
    }

    #[tokio::test]
    async fn put_requires_bucket() {
        let (_dir, storage) = storage().await;
        let result = storage
            .put_object_stream("test-bucket", "a.csv", reader(b"x"), PutOptions::replace())
            .await;
        assert!(matches!(result, Err(StorageError::NoSuchBucket(_))));
    }

    #[tokio::test]
    async fn put_and_read_back_nested_key() {
        let (dir, storage) = storage().await;
        storage.create_bucket("test-bucket", "").await.unwrap();

        let written = storage
            .put_object_stream(
                "test-bucket",
                "extract/deniro.csv",
                reader(b"year,score\n1968,86\n"),
                PutOptions::replace(),
            )
            .await
            .unwrap();

        assert_eq!(written, 19);
        assert!(dir.path().join("test-bucket/extract/deniro.csv").is_file());
        assert_eq!(
            storage
                .get_object("test-bucket", "extract/deniro.csv")
                .await
                .unwrap(),
            b"year,score\n1968,86\n"
        );
        assert_eq!(
            storage.list_objects("test-bucket", "extract/").await.unwrap(),
            vec!["extract/deniro.csv".to_string()]
        );
        assert_eq!(
            storage.locator("test-bucket", "extract/deniro.csv").to_string(),
            "file://test-bucket/extract/deniro.csv"
        );
    }

    #[tokio::test]
    async fn replace_overwrites_and_no_replace_refuses() {
        let (_dir, storage) = storage().await;
        storage.create_bucket("test-bucket", "").await.unwrap();

        storage
            .put_object_stream("test-bucket", "k.txt", reader(b"first"), PutOptions::default())
            .await
            .unwrap();

        let refused = storage
            .put_object_stream("test-bucket", "k.txt", reader(b"second"), PutOptions::default())
            .await;
        assert!(matches!(refused, Err(StorageError::ObjectExists(_))));

        storage
            .put_object_stream("test-bucket", "k.txt", reader(b"second"), PutOptions::replace())
            .await
            .unwrap();

        assert_eq!(
            storage.get_object("test-bucket", "k.txt").await.unwrap(),
            b"second"
        );
        assert_eq!(
            storage.list_objects("test-bucket", "").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn failed_stream_leaves_nothing_behind() {
        let (dir, storage) = storage().await;
        storage.create_bucket("test-bucket", "").await.unwrap();

        let result = storage
            .put_object_stream(
                "test-bucket",
                "extract/deniro.csv",
                Box::pin(BrokenReader { sent: false }),
                PutOptions::replace(),
            )
            .await;

        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        assert!(!storage
            .object_exists("test-bucket", "extract/deniro.csv")
            .await
            .unwrap());
        assert_eq!(
            std::fs::read_dir(dir.path().join(STAGING_DIR)).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let (_dir, storage) = storage().await;
        storage.create_bucket("test-bucket", "").await.unwrap();

        assert!(!storage.object_exists("test-bucket", "nope").await.unwrap());
        assert!(matches!(
            storage.get_object("test-bucket", "nope").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let (_dir, storage) = storage().await;
        storage.create_bucket("test-bucket", "").await.unwrap();

        let result = storage
            .put_object_stream("test-bucket", "../escape", reader(b"x"), PutOptions::replace())
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
