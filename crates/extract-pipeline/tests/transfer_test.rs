//! Transfer tests using wiremock for the source and filesystem storage as the destination.

mod helpers;

use std::sync::Arc;

use extract_pipeline::{transfer, TransferError};
use extract_storage::{ObjectStorage, StorageError};
use helpers::{csv_source, csv_url, failing_source, http_client, CountingStorage, TestStorage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn storage_with_bucket() -> (TestStorage, Arc<CountingStorage>) {
    let test_storage = TestStorage::new().await;
    test_storage
        .storage
        .create_bucket("test-bucket", "eu-central-1")
        .await
        .unwrap();
    let storage = Arc::new(CountingStorage::new(test_storage.storage.clone()));
    (test_storage, storage)
}

#[tokio::test]
async fn key_comes_from_last_path_segment() {
    let source = csv_source().await;
    let (_dir, storage) = storage_with_bucket().await;

    let locator = transfer(
        storage.as_ref(),
        &http_client(),
        &format!("{}?download=1#top", csv_url(&source)),
        "test-bucket",
    )
    .await
    .unwrap();

    assert_eq!(locator.bucket(), "test-bucket");
    assert_eq!(locator.key(), "extract/deniro.csv");
    assert_eq!(locator.to_string(), "file://test-bucket/extract/deniro.csv");
}

#[tokio::test]
async fn server_error_is_recoverable_and_writes_nothing() {
    let source = failing_source(503).await;
    let (_dir, storage) = storage_with_bucket().await;

    let err = transfer(
        storage.as_ref(),
        &http_client(),
        &csv_url(&source),
        "test-bucket",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TransferError::Status { status: 503, .. }));
    assert!(err.is_recoverable());
    assert_eq!(storage.put_calls(), 0);
}

#[tokio::test]
async fn url_without_file_name_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (_dir, storage) = storage_with_bucket().await;

    let err = transfer(
        storage.as_ref(),
        &http_client(),
        &format!("{}/data/", server.uri()),
        "test-bucket",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TransferError::InvalidUrl(_)));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn missing_bucket_surfaces_storage_error() {
    let source = csv_source().await;
    let test_storage = TestStorage::new().await;

    let err = transfer(
        test_storage.storage.as_ref(),
        &http_client(),
        &csv_url(&source),
        "absent-bucket",
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        TransferError::Storage(StorageError::NoSuchBucket(_))
    ));
}

#[tokio::test]
async fn large_body_is_stored_intact() {
    let server = MockServer::start().await;
    let body: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/big.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;
    let (_dir, storage) = storage_with_bucket().await;

    transfer(
        storage.as_ref(),
        &http_client(),
        &format!("{}/big.bin", server.uri()),
        "test-bucket",
    )
    .await
    .unwrap();

    let stored = storage
        .get_object("test-bucket", "extract/big.bin")
        .await
        .unwrap();
    assert_eq!(stored.len(), body.len());
    assert_eq!(stored, body);
}
