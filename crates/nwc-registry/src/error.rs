//! Registry error types.

use nwc_budget::LedgerError;
use nwc_core::CoreError;
use nwc_storage::StorageError;
use thiserror::Error;

/// Errors that can occur in registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A connection with this public key already exists.
    #[error("connection already exists: {0}")]
    DuplicateConnection(String),

    /// A granted permission key is not in the catalog.
    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    /// A budget definition was rejected.
    #[error("invalid budget #{index}: {reason}")]
    InvalidBudgetSpec {
        /// Position of the budget in the request.
        index: usize,
        /// Why it was rejected.
        reason: String,
    },

    /// An input failed edge hardening.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// No connection with this public key.
    #[error("connection not found: {0}")]
    NotFound(String),

    /// The persistence layer failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection's ledger refused to operate.
    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<CoreError> for RegistryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput { field, reason } => Self::InvalidInput { field, reason },
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
