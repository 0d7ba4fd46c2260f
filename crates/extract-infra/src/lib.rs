//! Extract Infrastructure Library
//!
//! Shared infrastructure used by the pipeline and the CLI:
//! - Telemetry initialization (tracing subscriber)
//! - The HTTP client used to download sources

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "http-client")]
pub mod http;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "http-client")]
pub use http::build_http_client;
