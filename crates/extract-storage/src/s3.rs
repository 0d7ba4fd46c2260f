use crate::keys::{validate_bucket, validate_object_key};
use crate::traits::{ObjectReader, ObjectStorage, PutOptions, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
};
use aws_sdk_s3::Client;
use extract_core::StaticCredentials;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of one multipart upload part. S3 requires at least 5 MiB for every part but the last.
const PART_SIZE: usize = 5 * 1024 * 1024;

/// The only region in which S3 rejects an explicit location constraint.
const DEFAULT_S3_REGION: &str = "us-east-1";

/// Connection settings for [`S3Storage`]
#[derive(Clone, Debug)]
pub struct S3Settings {
    /// AWS region (or region identifier for S3-compatible providers)
    pub region: String,
    /// Custom endpoint URL for S3-compatible providers
    /// (e.g. "http://localhost:4566" for LocalStack, "http://localhost:9000" for MinIO)
    pub endpoint_url: Option<String>,
    /// Static credentials; the SDK default chain is used when `None`
    pub credentials: Option<StaticCredentials>,
}

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    region: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// With a custom endpoint the client switches to path-style addressing, which
    /// LocalStack and MinIO require.
    pub async fn new(settings: S3Settings) -> StorageResult<Self> {
        if let Some(ref endpoint) = settings.endpoint_url {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(StorageError::ConfigError(format!(
                    "S3 endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }

        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(settings.region.clone()));

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(RetryConfig::standard().with_max_attempts(3));

        if let Some(ref credentials) = settings.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                "extract-static",
            ));
        }

        let sdk_config = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = settings.endpoint_url {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::debug!(
            region = %settings.region,
            endpoint = ?settings.endpoint_url,
            static_credentials = settings.credentials.is_some(),
            "S3 client configured"
        );

        Ok(Self::from_client(
            Client::from_conf(s3_config.build()),
            settings.region,
        ))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client, region: impl Into<String>) -> Self {
        S3Storage {
            client,
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    async fn put_single(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> StorageResult<u64> {
        let size = data.len() as u64;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .set_content_type(options.content_type.clone())
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| map_sdk_error(&e, bucket, StorageError::UploadFailed))?;

        Ok(size)
    }

    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        first_part: Vec<u8>,
        reader: &mut ObjectReader,
        options: &PutOptions,
    ) -> StorageResult<u64> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .set_content_type(options.content_type.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %bucket,
                    key = %key,
                    "Failed to create multipart upload"
                );
                map_sdk_error(&e, bucket, StorageError::UploadFailed)
            })?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::UploadFailed("No upload ID returned from S3".to_string()))?
            .to_string();

        let result = match self
            .upload_parts(bucket, key, &upload_id, first_part, reader)
            .await
        {
            Ok((parts, total_size)) => {
                let part_count = parts.len();
                self.client
                    .complete_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map(|_| {
                        tracing::debug!(
                            bucket = %bucket,
                            key = %key,
                            parts = part_count,
                            "Multipart upload completed"
                        );
                        total_size
                    })
                    .map_err(|e| map_sdk_error(&e, bucket, StorageError::UploadFailed))
            }
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.abort_multipart(bucket, key, &upload_id).await;
        }

        result
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        first_part: Vec<u8>,
        reader: &mut ObjectReader,
    ) -> StorageResult<(Vec<CompletedPart>, u64)> {
        let mut parts = Vec::new();
        let mut total_size = 0u64;
        let mut part_number = 1i32;
        let mut chunk = first_part;

        loop {
            let chunk_len = chunk.len();
            total_size += chunk_len as u64;

            let uploaded = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %DisplayErrorContext(&e),
                        bucket = %bucket,
                        key = %key,
                        part_number = part_number,
                        "Failed to upload part"
                    );
                    map_sdk_error(&e, bucket, StorageError::UploadFailed)
                })?;

            let etag = uploaded
                .e_tag()
                .ok_or_else(|| {
                    StorageError::UploadFailed(format!("No ETag returned for part {}", part_number))
                })?
                .to_string();

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(etag)
                    .build(),
            );

            if chunk_len < PART_SIZE {
                break;
            }

            chunk = read_part(reader).await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
            })?;
            if chunk.is_empty() {
                break;
            }
            part_number += 1;
        }

        Ok((parts, total_size))
    }

    async fn abort_multipart(&self, bucket: &str, key: &str, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            tracing::warn!(
                error = %DisplayErrorContext(&e),
                bucket = %bucket,
                key = %key,
                upload_id = %upload_id,
                "Failed to abort multipart upload"
            );
        }
    }
}

/// Location constraint for a bucket created in `region`; `None` for us-east-1.
fn location_constraint(region: &str) -> Option<BucketLocationConstraint> {
    if region.is_empty() || region == DEFAULT_S3_REGION {
        None
    } else {
        Some(BucketLocationConstraint::from(region))
    }
}

/// Read up to one part from the reader. Shorter than [`PART_SIZE`] only at EOF.
async fn read_part<R>(reader: &mut R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut part = Vec::new();
    reader.take(PART_SIZE as u64).read_to_end(&mut part).await?;
    Ok(part)
}

fn map_sdk_error<E>(
    err: &SdkError<E, HttpResponse>,
    bucket: &str,
    fallback: fn(String) -> StorageError,
) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = DisplayErrorContext(err).to_string();
    let code = err.as_service_error().and_then(|e| e.code());
    let status = err.raw_response().map(|r| r.status().as_u16());

    match (code, status) {
        (Some("NoSuchBucket"), _) => StorageError::NoSuchBucket(bucket.to_string()),
        (Some("AccessDenied"), _) | (_, Some(401)) | (_, Some(403)) => {
            StorageError::AccessDenied(message)
        }
        _ => fallback(message),
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match &e {
                SdkError::ServiceError(service_err)
                    if matches!(service_err.err(), HeadBucketError::NotFound(_)) =>
                {
                    Ok(false)
                }
                _ => {
                    tracing::error!(
                        error = %DisplayErrorContext(&e),
                        bucket = %bucket,
                        "S3 head bucket failed"
                    );
                    Err(map_sdk_error(&e, bucket, StorageError::BackendError))
                }
            },
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> StorageResult<()> {
        validate_bucket(bucket)?;
        let start = std::time::Instant::now();

        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(constraint) = location_constraint(region) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }

        if let Err(e) = request.send().await {
            let conflict = match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    CreateBucketError::BucketAlreadyOwnedByYou(_) => {
                        Some(StorageError::BucketAlreadyOwned(bucket.to_string()))
                    }
                    CreateBucketError::BucketAlreadyExists(_) => {
                        Some(StorageError::BucketAlreadyExists(bucket.to_string()))
                    }
                    _ => None,
                },
                _ => None,
            };

            if let Some(conflict) = conflict {
                return Err(conflict);
            }

            tracing::error!(
                error = %DisplayErrorContext(&e),
                bucket = %bucket,
                region = %region,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 create bucket failed"
            );
            return Err(map_sdk_error(&e, bucket, StorageError::BackendError));
        }

        tracing::info!(
            bucket = %bucket,
            region = %region,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 bucket created"
        );

        Ok(())
    }

    async fn put_object_stream(
        &self,
        bucket: &str,
        key: &str,
        mut reader: ObjectReader,
        options: PutOptions,
    ) -> StorageResult<u64> {
        validate_object_key(key)?;
        let start = std::time::Instant::now();

        if !options.replace && self.object_exists(bucket, key).await? {
            return Err(StorageError::ObjectExists(format!("{}/{}", bucket, key)));
        }

        // Small payloads fit in the first part and go out as a single PUT; anything
        // larger is streamed part by part, holding one part in memory at a time.
        let first_part = read_part(&mut reader)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to read from stream: {}", e)))?;

        let result = if first_part.len() < PART_SIZE {
            self.put_single(bucket, key, first_part, &options).await
        } else {
            self.put_multipart(bucket, key, first_part, &mut reader, &options)
                .await
        };

        match result {
            Ok(size) => {
                tracing::info!(
                    bucket = %bucket,
                    key = %key,
                    size_bytes = size,
                    expected_bytes = ?options.content_length,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload successful"
                );
                Ok(size)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload failed"
                );
                Err(e)
            }
        }
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match &e {
                SdkError::ServiceError(service_err)
                    if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
                {
                    Ok(false)
                }
                _ => Err(map_sdk_error(&e, bucket, StorageError::BackendError)),
            },
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();

        let response = match self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                if let SdkError::ServiceError(service_err) = &e {
                    if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) {
                        return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
                    }
                }
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                return Err(map_sdk_error(&e, bucket, StorageError::DownloadFailed));
            }
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        let bytes = data.into_bytes().to_vec();

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes)
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error(&e, bucket, StorageError::BackendError))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(String::from)),
            );

            match page.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        keys.sort();
        Ok(keys)
    }
}
