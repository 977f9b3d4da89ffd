//! Backend client error types.

use kunda_pricing::SourceError;

/// Name under which backend failures are reported to the pricing layer.
pub(crate) const BACKEND_NAME: &str = "kunda-backend";

/// Errors from backend calls.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Operation or path.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The request did not complete in time.
    #[error("{endpoint} timed out after {timeout_ms}ms")]
    Timeout {
        /// Operation or path.
        endpoint: String,
        /// Configured timeout.
        timeout_ms: u64,
    },
    /// The backend returned a non-2xx status.
    #[error("backend {endpoint} returned {status}: {body}")]
    Status {
        /// Operation or path.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {reason}")]
    Deserialization {
        /// Operation or path.
        endpoint: String,
        /// Parser message.
        reason: String,
    },
    /// Synchronous call made without a Tokio runtime.
    #[error("no async runtime available for HTTP request")]
    NoRuntime,
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<BackendError> for SourceError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Deserialization { .. } => SourceError::InvalidValue {
                backend: BACKEND_NAME.to_string(),
                reason: e.to_string(),
            },
            other => SourceError::Unavailable {
                backend: BACKEND_NAME.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
