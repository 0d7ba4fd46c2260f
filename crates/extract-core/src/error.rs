//! Error types for domain models.
//!
//! Storage and pipeline errors live in their own crates; this module only covers
//! failures that can happen while deriving keys and parsing locators.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL has no file name in its path: {0}")]
    MissingFileName(String),

    #[error("Invalid object locator: {0}")]
    InvalidLocator(String),
}
