//! Extract Core Library
//!
//! This crate provides the domain models, error types, configuration and validation
//! shared by the storage backends, the pipeline tasks and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod task_error;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, HttpConfig, LogFormat, StaticCredentials, StorageConfig};
pub use error::ModelError;
pub use models::{object_key_for_url, ObjectLocator, PipelineParams, RetryPolicy};
pub use storage_types::StorageBackend;
pub use task_error::{TaskError, TaskResultExt};
