//! NWC Budget - spending caps with periodic resets.
//!
//! A connection owns zero or more [`Budget`]s. Each one caps consumption in
//! millisatoshis over a refresh window; a window of `0` is a lifetime cap.
//! Budgets on one connection are conjunctive: a spend must fit every one of
//! them, and a successful spend is charged to all of them together.
//!
//! [`BudgetLedger`] holds a connection's budget set behind a single lock so
//! that the rollover, the headroom check and the increment happen as one
//! step. No I/O happens under that lock; callers persist the returned
//! [`LedgerSnapshot`] afterwards.
//!
//! # Example
//!
//! ```
//! use nwc_budget::{Budget, BudgetLedger, Decision};
//!
//! let now = 1_700_000_000;
//! let ledger = BudgetLedger::new(vec![Budget::new(100_000, 86_400, now, now)], 0);
//!
//! let outcome = ledger.authorize(40_000, now).unwrap();
//! assert_eq!(outcome.decision, Decision::Allowed);
//!
//! let outcome = ledger.authorize(70_000, now).unwrap();
//! assert_eq!(outcome.decision, Decision::Denied { budget: 0, shortfall_msats: 10_000 });
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]

pub mod prelude;

pub mod budget;
pub mod decision;
pub mod error;
pub mod ledger;

pub use budget::{Budget, REFRESH_DAY, REFRESH_MONTH, REFRESH_WEEK, REFRESH_YEAR, authorize_budgets};
pub use decision::{Decision, Evaluation};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{BudgetLedger, LedgerOutcome, LedgerSnapshot};
