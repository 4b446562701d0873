//! Coinscope Egress Connector
//!
//! This crate provides the connector to the hosted Gemini vision model:
//! - HTTP client configuration and retry policy
//! - Analysis request building (instruction, response schema, inline image)
//! - Response normalization into coin analysis records

pub mod client;
pub mod gemini;
pub mod schema;

use thiserror::Error;

/// Egress error types
#[derive(Debug, Error)]
pub enum EgressError {
    /// Invalid connector configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Provider returned a non-success status
    #[error("Provider returned status {status_code}: {message}")]
    ProviderError { status_code: u16, message: String },

    /// Provider asked us to back off
    #[error("Rate limit exceeded{}", retry_after_secs.map(|s| format!(": retry after {}s", s)).unwrap_or_default())]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    /// Request exceeded the configured timeout
    #[error("Request timeout after {0}s")]
    Timeout(u64),

    /// The provider envelope itself could not be parsed
    #[error("Failed to parse provider response: {0}")]
    ParseError(String),

    /// The model answered, but its analysis document is not valid against
    /// the response schema. Surfaced to users differently from transport
    /// failures.
    #[error("Model returned an invalid analysis document: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, EgressError>;

impl From<EgressError> for coinscope_core::Error {
    fn from(err: EgressError) -> Self {
        match err {
            EgressError::InvalidFormat(msg) => coinscope_core::Error::InvalidResponseFormat(msg),
            EgressError::RateLimitExceeded { retry_after_secs } => {
                coinscope_core::Error::RateLimitExceeded { retry_after_secs }
            }
            other => coinscope_core::Error::Provider(other.to_string()),
        }
    }
}
