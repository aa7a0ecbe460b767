//! Support-site lookup error types.

use std::sync::Arc;

use macmodels_core::LookupFailure;

/// Errors from a single product lookup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// Endpoint URL could not be parsed.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body is not a product document.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { LookupError::Timeout } else { LookupError::Network(Arc::new(err)) }
    }
}

impl From<LookupError> for LookupFailure {
    fn from(err: LookupError) -> Self {
        LookupFailure(err.to_string())
    }
}
