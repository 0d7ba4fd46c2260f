//! Test helpers: filesystem-backed storage, a call-counting storage wrapper and a mock
//! HTTP source serving the CSV fixture.
//!
//! Run from workspace root: `cargo test -p extract-pipeline`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use extract_core::HttpConfig;
use extract_storage::{
    LocalStorage, ObjectReader, ObjectStorage, PutOptions, StorageBackend, StorageResult,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// First lines of the De Niro ratings file.
pub const DENIRO_CSV: &str = "\"Year\", \"Score\", \"Title\"\n\
1968,  86, \"Greetings\"\n\
1970,  17, \"Bloody Mama\"\n\
1970,  73, \"Hi, Mom!\"\n\
1971,  40, \"Born to Win\"\n";

pub const CSV_PATH: &str = "/~jburkardt/data/csv/deniro.csv";

/// Filesystem storage rooted in a temporary directory.
pub struct TestStorage {
    pub temp_dir: TempDir,
    pub storage: Arc<LocalStorage>,
}

impl TestStorage {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let storage = LocalStorage::new(temp_dir.path())
            .await
            .expect("Failed to create local storage");
        Self {
            temp_dir,
            storage: Arc::new(storage),
        }
    }
}

/// Storage wrapper counting calls to the mutating methods.
pub struct CountingStorage {
    inner: Arc<dyn ObjectStorage>,
    pub bucket_exists_calls: AtomicUsize,
    pub create_bucket_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
}

impl CountingStorage {
    pub fn new(inner: Arc<dyn ObjectStorage>) -> Self {
        Self {
            inner,
            bucket_exists_calls: AtomicUsize::new(0),
            create_bucket_calls: AtomicUsize::new(0),
            put_calls: AtomicUsize::new(0),
        }
    }

    pub fn create_bucket_calls(&self) -> usize {
        self.create_bucket_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn bucket_exists_calls(&self) -> usize {
        self.bucket_exists_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for CountingStorage {
    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        self.bucket_exists_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.bucket_exists(bucket).await
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> StorageResult<()> {
        self.create_bucket_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_bucket(bucket, region).await
    }

    async fn put_object_stream(
        &self,
        bucket: &str,
        key: &str,
        reader: ObjectReader,
        options: PutOptions,
    ) -> StorageResult<u64> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .put_object_stream(bucket, key, reader, options)
            .await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        self.inner.object_exists(bucket, key).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.get_object(bucket, key).await
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list_objects(bucket, prefix).await
    }
}

/// Mock server answering `GET {CSV_PATH}` with the CSV fixture.
pub async fn csv_source() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CSV_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .set_body_string(DENIRO_CSV),
        )
        .mount(&server)
        .await;
    server
}

/// Mock server answering every request with `status`.
pub async fn failing_source(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

pub fn csv_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), CSV_PATH)
}

pub fn http_client() -> reqwest::Client {
    extract_infra::build_http_client(&HttpConfig::default()).expect("Failed to build HTTP client")
}
