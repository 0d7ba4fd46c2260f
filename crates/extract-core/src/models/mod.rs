//! Domain models for the extract pipeline

pub mod object;
pub mod params;

pub use object::{object_key_for_url, ObjectLocator};
pub use params::{PipelineParams, RetryPolicy};
