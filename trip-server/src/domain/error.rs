//! Domain error types.
//!
//! Every fallible core operation returns one of these kinds. They are
//! distinct from adapter errors (HTTP, payment processor, seed files),
//! which are folded into [`DomainError::Upstream`] at the boundary.

/// Domain-level errors surfaced to callers of the core components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Malformed or tampered input (price mismatch, negative amount, empty field)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown route, booking or review id
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Caller does not own the resource or lacks the role
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// State machine violation
    #[error("{0}")]
    InvalidTransition(String),

    /// Payment processor or store call failed
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        DomainError::Upstream(message.into())
    }
}
