//! Storage error types.

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A storage operation failed.
    #[error("storage error: {0}")]
    Internal(String),

    /// The backend is unreachable or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// An I/O operation on the backing files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The namespace or key is invalid.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
