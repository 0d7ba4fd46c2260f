//! Object keys and locators
//!
//! The destination key is derived from the source URL alone, so repeated runs against the
//! same URL always target the same object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::constants::EXTRACT_KEY_PREFIX;
use crate::error::ModelError;

/// Derive the destination object key for a source URL: `extract/{last path segment}`.
///
/// Only the URL path is considered; query string and fragment never end up in the key.
/// The segment is kept exactly as it appears in the URL (no percent-decoding).
pub fn object_key_for_url(url: &str) -> Result<String, ModelError> {
    let parsed = Url::parse(url).map_err(|e| ModelError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let file_name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ModelError::MissingFileName(url.to_string()))?;

    Ok(format!("{}{}", EXTRACT_KEY_PREFIX, file_name))
}

/// Address of a stored object: `{scheme}://{bucket}/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocator {
    scheme: String,
    bucket: String,
    key: String,
}

impl ObjectLocator {
    pub fn new(
        scheme: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

impl FromStr for ObjectLocator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ModelError::InvalidLocator(format!("missing scheme in '{}'", s)))?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| ModelError::InvalidLocator(format!("missing key in '{}'", s)))?;

        if scheme.is_empty() || bucket.is_empty() || key.is_empty() {
            return Err(ModelError::InvalidLocator(format!(
                "scheme, bucket and key must be non-empty in '{}'",
                s
            )));
        }

        Ok(Self::new(scheme, bucket, key))
    }
}

impl Serialize for ObjectLocator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectLocator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
