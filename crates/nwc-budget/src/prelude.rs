//! Prelude module - commonly used types for convenient import.
//!
//! Use `use nwc_budget::prelude::*;` to import all essential types.

pub use crate::{Budget, BudgetLedger, Decision, LedgerError, LedgerOutcome, LedgerResult, LedgerSnapshot};
