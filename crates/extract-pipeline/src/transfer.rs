//! Streaming copy of a remote file into object storage

use extract_core::{object_key_for_url, ObjectLocator};
use extract_storage::{ObjectReader, ObjectStorage, PutOptions};
use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio_util::io::StreamReader;

use crate::error::TransferError;

/// Copy `url` into `bucket` at `extract/<last path segment of url>`.
///
/// The response body is streamed into storage; at no point is the whole file held in
/// memory. A non-2xx answer fails the transfer before anything is written. An existing
/// object at the key is replaced.
pub async fn transfer(
    storage: &dyn ObjectStorage,
    http: &Client,
    url: &str,
    bucket: &str,
) -> Result<ObjectLocator, TransferError> {
    let key = object_key_for_url(url)?;
    let start = std::time::Instant::now();

    tracing::info!(url = %url, bucket = %bucket, key = %key, "Downloading source");

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|source| TransferError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!(url = %url, status = status.as_u16(), "Source returned an error status");
        return Err(TransferError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut options = PutOptions::replace().with_content_length(response.content_length());
    if let Some(content_type) = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        options = options.with_content_type(content_type);
    }

    let body = response.bytes_stream().map_err(std::io::Error::other);
    let reader: ObjectReader = Box::pin(StreamReader::new(Box::pin(body)));

    let size = storage
        .put_object_stream(bucket, &key, reader, options)
        .await?;

    let locator = storage.locator(bucket, &key);

    tracing::info!(
        url = %url,
        locator = %locator,
        size_bytes = size,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "File saved"
    );

    Ok(locator)
}
