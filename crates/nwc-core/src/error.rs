//! Core error types.

use thiserror::Error;

/// Errors raised by core validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// An input at the edge of the system failed hardening checks.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
