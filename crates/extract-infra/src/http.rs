//! HTTP client used to download pipeline sources

use anyhow::{Context, Result};
use extract_core::HttpConfig;
use reqwest::Client;

/// User agent sent with every source download.
pub const USER_AGENT: &str = concat!("extract/", env!("CARGO_PKG_VERSION"));

/// Build the download client from the configured timeouts.
///
/// The overall timeout bounds a whole download, body included, so it must cover the
/// largest expected source.
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .build()
        .context("Failed to create HTTP client for source downloads")
}
