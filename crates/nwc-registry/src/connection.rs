//! Connection records and creation requests.

use nwc_budget::Budget;
use nwc_core::hardening::validate_msats;
use nwc_core::{ConnectionStatus, UnixSeconds};
use nwc_crypto::PublicKey;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// A paired client and everything it has been granted.
///
/// This is also the persisted record: one JSON document per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Client public key; immutable identity.
    pub pubkey: PublicKey,
    /// Free-text label.
    pub description: String,
    /// Granted permission keys.
    pub permissions: Vec<String>,
    /// Expiry; `0` never expires.
    pub expires_at: UnixSeconds,
    /// Creation time.
    pub created_at: UnixSeconds,
    /// Time of the last authorized action.
    pub last_used: UnixSeconds,
    /// Owned budgets, conjunctive.
    #[serde(default)]
    pub budgets: Vec<Budget>,
}

impl Connection {
    /// Lifecycle status at `now`.
    #[must_use]
    pub fn status(&self, now: UnixSeconds) -> ConnectionStatus {
        ConnectionStatus::evaluate(self.expires_at, now)
    }
}

/// Budget definition as supplied by a client.
///
/// Fields are signed because they arrive from the wire; negative values are
/// rejected at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSpec {
    /// Cap per period, msats.
    pub budget_msats: i64,
    /// Period in seconds, `0` for a lifetime cap.
    pub refresh_window: i64,
    /// Client-side definition time; defaults to now.
    #[serde(default)]
    pub created_at: Option<UnixSeconds>,
}

impl BudgetSpec {
    /// A spec with no explicit creation time.
    #[must_use]
    pub fn new(budget_msats: i64, refresh_window: i64) -> Self {
        Self {
            budget_msats,
            refresh_window,
            created_at: None,
        }
    }

    pub(crate) fn into_budget(self, index: usize, now: UnixSeconds) -> RegistryResult<Budget> {
        let invalid = |reason: String| RegistryError::InvalidBudgetSpec { index, reason };

        let cap = validate_msats("budget_msats", self.budget_msats)
            .map_err(|e| invalid(e.to_string()))?;
        let window = u64::try_from(self.refresh_window)
            .map_err(|_| invalid("refresh_window must not be negative".to_string()))?;
        let created_at = self.created_at.unwrap_or(now);
        if created_at < 0 {
            return Err(invalid("created_at must not be negative".to_string()));
        }
        Ok(Budget::new(cap, window, created_at, now))
    }
}

/// Request to create a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConnection {
    /// Client public key, lowercase hex.
    pub pubkey: String,
    /// Free-text label.
    #[serde(default)]
    pub description: String,
    /// Permission keys to grant.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Expiry; `0` never expires.
    #[serde(default)]
    pub expires_at: UnixSeconds,
    /// Budgets to attach.
    #[serde(default)]
    pub budgets: Vec<BudgetSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: UnixSeconds = 1_700_000_000;

    #[test]
    fn test_spec_initializes_window_at_now() {
        let spec = BudgetSpec {
            budget_msats: 5_000,
            refresh_window: 604_800,
            created_at: Some(NOW - 60),
        };
        let budget = spec.into_budget(0, NOW).unwrap();
        assert_eq!(budget.window_start, NOW);
        assert_eq!(budget.created_at, NOW - 60);
        assert_eq!(budget.used_msats, 0);
    }

    #[test]
    fn test_spec_rejects_negative_values() {
        let err = BudgetSpec::new(-1, 0).into_budget(2, NOW).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBudgetSpec { index: 2, .. }));

        let err = BudgetSpec::new(1, -86_400).into_budget(0, NOW).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBudgetSpec { index: 0, .. }));
    }

    #[test]
    fn test_spec_rejects_absurd_cap() {
        let err = BudgetSpec::new(10_000_000_000, 0)
            .into_budget(0, NOW)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBudgetSpec { .. }));
    }

    #[test]
    fn test_zero_cap_is_valid() {
        assert!(BudgetSpec::new(0, 0).into_budget(0, NOW).is_ok());
    }

    #[test]
    fn test_request_defaults_from_json() {
        let req: NewConnection = serde_json::from_str(
            r#"{"pubkey":"b889ff5b1513b641e2a139f661a661364979c5beee91842f8f0ef42ab558e9d4"}"#,
        )
        .unwrap();
        assert!(req.permissions.is_empty());
        assert!(req.budgets.is_empty());
        assert_eq!(req.expires_at, 0);
    }
}
