//! Source URL validation

use anyhow::Result;
use url::Url;

use crate::models::object_key_for_url;

/// Validate a source URL
///
/// The URL must be absolute, use HTTP or HTTPS, and end in a file name that can be turned
/// into an object key.
pub fn validate_source_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid source URL '{}': {}", url, e))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(anyhow::anyhow!(
            "Source URL '{}' must use http or https, got '{}'",
            url,
            parsed.scheme()
        ));
    }

    object_key_for_url(url)?;
    Ok(())
}
