//! Connection lifecycle status.

use serde::{Deserialize, Serialize};

use crate::types::{NEVER_EXPIRES, UnixSeconds};

/// Derived lifecycle state of a connection.
///
/// Never stored: it is recomputed from `expires_at` and the current time on
/// every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// The connection may act.
    Active,
    /// The expiry has been reached.
    Expired,
}

impl ConnectionStatus {
    /// Evaluate the status for an expiry timestamp at `now`.
    ///
    /// A connection is active while `expires_at == 0` or `expires_at > now`,
    /// so a connection whose expiry equals `now` is already expired.
    #[must_use]
    pub fn evaluate(expires_at: UnixSeconds, now: UnixSeconds) -> Self {
        if expires_at == NEVER_EXPIRES || expires_at > now {
            Self::Active
        } else {
            Self::Expired
        }
    }

    /// Whether this status permits actions.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
        }
    }
}
