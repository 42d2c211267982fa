//! Error types for settle-core.

use thiserror::Error;

/// Core error taxonomy.
///
/// Every failed operation leaves the entity it was called on untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed, zero or out-of-range input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation would break a conservation or monotonicity invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The operation is not legal in the current lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The operation falls outside its expiration or timelock window.
    #[error("Expired: {0}")]
    Expired(String),
}

impl CoreError {
    /// Short, stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::InvalidState(_) => "invalid_state",
            Self::Expired(_) => "expired",
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn expired(msg: impl Into<String>) -> Self {
        Self::Expired(msg.into())
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
