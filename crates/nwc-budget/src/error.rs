//! Ledger error types.

use thiserror::Error;

/// Errors that can occur while operating on a [`BudgetLedger`](crate::BudgetLedger).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger lock was poisoned; its state can no longer be trusted.
    #[error("budget ledger lock poisoned")]
    Poisoned,

    /// The owning connection has been deleted.
    #[error("budget ledger retired")]
    Retired,

    /// A budget index did not exist.
    #[error("no budget at index {index} (connection has {count})")]
    NoSuchBudget {
        /// Requested index.
        index: usize,
        /// Number of budgets on the connection.
        count: usize,
    },
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
