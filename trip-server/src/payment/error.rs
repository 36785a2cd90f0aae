//! Payment processor error types.

use crate::domain::DomainError;

/// Errors from a payment processor.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected shape
    #[error("unexpected processor response: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Processor returned an error status
    #[error("processor error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("checkout session not found: {0}")]
    SessionNotFound(String),

    /// Rejected before any request was sent
    #[error("invalid checkout session id: {0:?}")]
    InvalidSessionId(String),

    #[error("rate limited by payment processor")]
    RateLimited,

    #[error("unauthorized (invalid secret key)")]
    Unauthorized,

    #[error("payment processor not configured: {0}")]
    NotConfigured(String),
}

/// Processor failures surface as `Upstream`, keeping the message. A
/// malformed session id is the caller's mistake and is a `Validation`.
impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSessionId(_) => DomainError::validation(err.to_string()),
            _ => DomainError::upstream(err.to_string()),
        }
    }
}
