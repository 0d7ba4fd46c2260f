//! Bucket name validation
//!
//! Follows the S3 general purpose bucket naming rules. The filesystem backend applies the
//! same rules so a name accepted locally is also accepted by S3.

use anyhow::{Context, Result};
use regex::Regex;

pub const MIN_BUCKET_NAME_LENGTH: usize = 3;
pub const MAX_BUCKET_NAME_LENGTH: usize = 63;

/// Validate a bucket name
///
/// Rules:
/// - 3 to 63 characters
/// - lowercase letters, digits, dots and hyphens only
/// - begins and ends with a letter or digit
/// - no two adjacent dots
/// - not formatted as an IPv4 address
pub fn validate_bucket_name(name: &str) -> Result<()> {
    if name.len() < MIN_BUCKET_NAME_LENGTH || name.len() > MAX_BUCKET_NAME_LENGTH {
        return Err(anyhow::anyhow!(
            "Bucket name '{}' must be between {} and {} characters long",
            name,
            MIN_BUCKET_NAME_LENGTH,
            MAX_BUCKET_NAME_LENGTH
        ));
    }

    let pattern = Regex::new(r"^[a-z0-9][a-z0-9.\-]*[a-z0-9]$")
        .context("Failed to compile bucket name validation regex")?;

    if !pattern.is_match(name) {
        return Err(anyhow::anyhow!(
            "Bucket name '{}' contains invalid characters. Allowed: lowercase letters, digits, dot (.), hyphen (-); must start and end with a letter or digit",
            name
        ));
    }

    if name.contains("..") {
        return Err(anyhow::anyhow!(
            "Bucket name '{}' must not contain adjacent dots",
            name
        ));
    }

    let ip_pattern = Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$")
        .context("Failed to compile IP address regex")?;

    if ip_pattern.is_match(name) {
        return Err(anyhow::anyhow!(
            "Bucket name '{}' must not be formatted as an IP address",
            name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        for name in ["test-bucket", "abc", "my.data.bucket", "bucket-2024"] {
            assert!(validate_bucket_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn rejects_bad_length() {
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
        assert!(validate_bucket_name(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn rejects_bad_characters() {
        for name in ["Test-Bucket", "under_score", "-leading", "trailing-", "sla/sh", ".dot"] {
            assert!(validate_bucket_name(name).is_err(), "{} should be invalid", name);
        }
    }

    #[test]
    fn rejects_adjacent_dots_and_ip_addresses() {
        assert!(validate_bucket_name("my..bucket").is_err());
        assert!(validate_bucket_name("192.168.5.4").is_err());
    }
}
