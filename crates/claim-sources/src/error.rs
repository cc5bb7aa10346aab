//! Evidence source error types.

use thiserror::Error;

/// Errors raised while building the source catalog or querying a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No source instance is registered under this key.
    #[error("source not found: {0}")]
    NotFound(String),

    /// Tried to register an instance for a key the registry does not list.
    #[error("source '{0}' is not in the registry")]
    Unregistered(String),

    /// Two registry entries share a key.
    #[error("duplicate source key: {0}")]
    DuplicateKey(String),

    /// A configured source definition is incomplete or inconsistent.
    #[error("invalid source '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status code.
    #[error("source '{key}' returned {status}: {message}")]
    Api {
        /// Registry key of the source.
        key: String,
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// The source asked us to back off (HTTP 429).
    #[error("source '{key}' is rate limited, retry after {retry_after_secs}s")]
    RateLimited { key: String, retry_after_secs: u64 },

    /// Failed to parse a source response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The source is temporarily unable to serve queries.
    #[error("source unavailable: {0}")]
    Unavailable(String),
}
