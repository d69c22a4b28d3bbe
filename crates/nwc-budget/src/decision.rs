//! Outcome of a budget authorization.

use std::fmt;

use nwc_core::Msats;
use serde::{Deserialize, Serialize};

/// Verdict of the budget stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Every budget had headroom; the amount has been charged to all of them.
    Allowed,
    /// At least one budget lacked headroom; nothing was charged.
    Denied {
        /// Index of the first budget (in connection order) that refused.
        budget: usize,
        /// How far the request overshot that budget.
        shortfall_msats: Msats,
    },
}

impl Decision {
    /// Whether the spend may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "allowed"),
            Self::Denied {
                budget,
                shortfall_msats,
            } => write!(f, "denied by budget #{budget} (short {shortfall_msats} msats)"),
        }
    }
}

/// Result of evaluating a budget set, with whether any budget state changed.
///
/// `mutated` is true when a window rolled over or an amount was charged;
/// a denied request can still mutate state through rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// The verdict.
    pub decision: Decision,
    /// Whether any budget changed.
    pub mutated: bool,
}
