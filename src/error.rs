// src/error.rs

//! Unified error handling for the scraper application.
//!
//! Upstream failures are modeled as dedicated variants rather than
//! stringly-typed subclasses so that callers can match exhaustively on
//! the error kind.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request could not be completed, or the server returned a
    /// non-success HTTP status
    #[error("transport error calling {endpoint}: {message}")]
    Transport {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// Upstream rejected the request's credentials (code 10000)
    #[error("authentication error: {0}")]
    Auth(String),

    /// Upstream has no record for the request (code 10001). Some
    /// endpoints also use this for an empty result set.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Any other non-success application code
    #[error("upstream error {code}: {message}")]
    UnknownApi { code: String, message: String },

    /// Cached entry exists but is older than the freshness window
    #[error("cache entry '{key}' expired, last written {written}")]
    CacheExpired { key: String, written: DateTime<Utc> },

    /// A faculty/department code in a module record has no known name
    #[error("unknown {field} code '{code}'")]
    DataConsistency { field: &'static str, code: String },

    /// Module code cannot be split into subject and catalog number
    #[error("'{0}' does not look like a module code")]
    ModuleCode(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction or body handling failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a transport error for a failed request.
    pub fn transport(
        endpoint: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True if this error is the upstream's "record not found" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True if retrying the operation could plausibly succeed.
    ///
    /// Authentication and not-found errors are deterministic; transport
    /// and unknown application errors may be transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::UnknownApi { .. } | Self::Http(_)
        )
    }
}
