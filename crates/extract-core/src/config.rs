//! Configuration module
//!
//! Pipeline parameters, storage connection settings and HTTP client settings, read from the
//! environment (and a `.env` file when present). Tests build configuration through
//! [`Config::from_lookup`] so they never touch the process environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::models::{PipelineParams, RetryPolicy};
use crate::storage_types::StorageBackend;
use crate::validation::{validate_bucket_name, validate_source_url};

const HTTP_TIMEOUT_SECS: u64 = 300;
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Static access key pair, used against emulators and S3-compatible providers.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl StaticCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Storage connection settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Custom endpoint for S3-compatible providers (LocalStack, MinIO, ...)
    pub s3_endpoint: Option<String>,
    /// Falls back to the SDK default credential chain when `None`.
    pub credentials: Option<StaticCredentials>,
    pub local_storage_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            s3_endpoint: None,
            credentials: None,
            local_storage_path: None,
        }
    }
}

/// Download client settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: HTTP_TIMEOUT_SECS,
            connect_timeout_secs: HTTP_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub params: PipelineParams,
    pub retry: RetryPolicy,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineParams::default();
        let params = PipelineParams {
            url: lookup("PIPELINE_URL").unwrap_or(defaults.url),
            s3_bucket: lookup("S3_BUCKET").unwrap_or(defaults.s3_bucket),
            region: lookup("S3_REGION")
                .or_else(|| lookup("AWS_REGION"))
                .unwrap_or(defaults.region),
        };

        let retry = RetryPolicy {
            retries: parse_or(&lookup, "TASK_RETRIES", RetryPolicy::DEFAULT_RETRIES)?,
            retry_delay_secs: parse_or(
                &lookup,
                "TASK_RETRY_DELAY_SECS",
                RetryPolicy::DEFAULT_RETRY_DELAY_SECS,
            )?,
        };

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let credentials = match (lookup("AWS_ACCESS_KEY_ID"), lookup("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            _ => {
                return Err(anyhow::anyhow!(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
                ))
            }
        };

        let storage = StorageConfig {
            backend,
            s3_endpoint: lookup("S3_ENDPOINT").filter(|s| !s.trim().is_empty()),
            credentials,
            local_storage_path: lookup("LOCAL_STORAGE_PATH").map(PathBuf::from),
        };

        let http = HttpConfig {
            timeout_secs: parse_or(&lookup, "HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS)?,
            connect_timeout_secs: parse_or(
                &lookup,
                "HTTP_CONNECT_TIMEOUT_SECS",
                HTTP_CONNECT_TIMEOUT_SECS,
            )?,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Config {
            params,
            retry,
            storage,
            http,
            log_format,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        validate_source_url(&self.params.url)?;
        validate_bucket_name(&self.params.s3_bucket)?;

        if self.params.region.trim().is_empty() {
            return Err(anyhow::anyhow!("S3_REGION or AWS_REGION must not be empty"));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if let Some(ref endpoint) = self.storage.s3_endpoint {
                    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                        return Err(anyhow::anyhow!(
                            "S3_ENDPOINT must be an http:// or https:// URL, got '{}'",
                            endpoint
                        ));
                    }
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.http.timeout_secs == 0 {
            return Err(anyhow::anyhow!("HTTP_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: '{}'", key, raw)),
        None => Ok(default),
    }
}
