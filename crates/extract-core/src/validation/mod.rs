//! Validation modules

pub mod bucket;
pub mod source;

pub use bucket::{validate_bucket_name, MAX_BUCKET_NAME_LENGTH, MIN_BUCKET_NAME_LENGTH};
pub use source::validate_source_url;
