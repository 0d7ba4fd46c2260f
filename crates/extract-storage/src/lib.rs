//! Extract Storage Library
//!
//! Object storage abstraction used by the pipeline tasks, with an S3 implementation
//! (AWS, LocalStack, MinIO and other S3-compatible providers) and a local filesystem
//! implementation.
//!
//! # Layout of the filesystem backend
//!
//! - bucket: `{base_path}/{bucket}/`
//! - object: `{base_path}/{bucket}/{key}` (key segments become directories)
//! - in-flight uploads: `{base_path}/.staging/`
//!
//! Keys must not contain `..` segments, empty segments or a leading `/`. Key checks live in
//! the `keys` module so all backends accept the same keys.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use extract_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Settings, S3Storage};
pub use traits::{ObjectReader, ObjectStorage, PutOptions, StorageError, StorageResult};
