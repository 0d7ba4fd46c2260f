//! The pipeline's tasks

pub mod create_bucket;
pub mod download_to_storage;

pub use create_bucket::CreateBucketTask;
pub use download_to_storage::DownloadToStorageTask;
