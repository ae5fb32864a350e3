// src/error.rs

//! Unified error handling for the list exporter.

use std::fmt;

use thiserror::Error;

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// A 429 never becomes an error value; the pagination loop waits it out.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed (checkpoint store or output sinks)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed before a status was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Missing credential, bad list identifier or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration value out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Provider answered with a status that is neither 200 nor 429
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Provider answered 200 but the body is not the expected structure
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fatal API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed response error.
    pub fn malformed(message: impl fmt::Display) -> Self {
        Self::MalformedResponse(message.to_string())
    }

    /// Whether this error came from the provider rather than local state.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::MalformedResponse(_) | Self::Http(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = AppError::api(503, "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "API error (status 503): Service Unavailable"
        );
    }

    #[test]
    fn remote_errors_are_classified() {
        assert!(AppError::api(500, "boom").is_remote());
        assert!(AppError::malformed("not json").is_remote());
        assert!(!AppError::config("no token").is_remote());
        assert!(!AppError::Io(std::io::Error::other("disk")).is_remote());
    }
}
