//! Per-connection budget ledger.
//!
//! [`BudgetLedger`] serializes every read-rollover-check-increment sequence
//! for one connection behind a single [`Mutex`]. Ledgers of different
//! connections never share a lock. The critical section is pure arithmetic;
//! persistence happens outside it using the returned [`LedgerSnapshot`],
//! ordered by its `revision`.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use nwc_core::{Msats, UnixSeconds};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::budget::{Budget, authorize_budgets};
use crate::decision::Decision;
use crate::error::{LedgerError, LedgerResult};

struct LedgerState {
    budgets: Vec<Budget>,
    last_used: UnixSeconds,
    revision: u64,
    retired: bool,
}

impl LedgerState {
    fn bump(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }

    fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            budgets: self.budgets.clone(),
            last_used: self.last_used,
            revision: self.revision,
        }
    }
}

/// Point-in-time copy of a ledger's mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// All budgets in connection order.
    pub budgets: Vec<Budget>,
    /// Time of the last allowed action, `0` if none.
    pub last_used: UnixSeconds,
    /// Monotonic mutation counter.
    pub revision: u64,
}

/// Result of [`BudgetLedger::authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOutcome {
    /// The verdict.
    pub decision: Decision,
    /// State to persist, present when the call changed anything.
    pub snapshot: Option<LedgerSnapshot>,
}

/// The budget set of one connection.
pub struct BudgetLedger {
    state: Mutex<LedgerState>,
}

impl BudgetLedger {
    /// Create a ledger over `budgets`.
    #[must_use]
    pub fn new(budgets: Vec<Budget>, last_used: UnixSeconds) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                budgets,
                last_used,
                revision: 0,
                retired: false,
            }),
        }
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, LedgerState>> {
        self.state.lock().map_err(|_| {
            error!("budget ledger lock poisoned; refusing to authorize");
            LedgerError::Poisoned
        })
    }

    fn lock_live(&self) -> LedgerResult<MutexGuard<'_, LedgerState>> {
        let state = self.lock()?;
        if state.retired {
            return Err(LedgerError::Retired);
        }
        Ok(state)
    }

    /// Atomically roll forward, check and charge `amount` against every budget.
    ///
    /// On [`Decision::Allowed`] the ledger also records `now` as the last use.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Retired`] once the connection is deleted,
    /// [`LedgerError::Poisoned`] if the lock is poisoned. Neither ever allows.
    pub fn authorize(&self, amount: Msats, now: UnixSeconds) -> LedgerResult<LedgerOutcome> {
        let mut state = self.lock_live()?;
        let eval = authorize_budgets(&mut state.budgets, amount, now);

        let mut mutated = eval.mutated;
        if eval.decision.is_allowed() && state.last_used != now {
            state.last_used = now;
            mutated = true;
        }
        if mutated {
            state.bump();
        }

        debug!(
            amount_msats = amount,
            decision = %eval.decision,
            revision = state.revision,
            "budget ledger evaluated"
        );

        Ok(LedgerOutcome {
            decision: eval.decision,
            snapshot: mutated.then(|| state.snapshot()),
        })
    }

    /// Budgets as they would look at `now`, without mutating the ledger.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Poisoned`] if the lock is poisoned.
    pub fn resolved(&self, now: UnixSeconds) -> LedgerResult<Vec<Budget>> {
        let state = self.lock()?;
        let mut budgets = state.budgets.clone();
        drop(state);
        for budget in &mut budgets {
            budget.rollover(now);
        }
        Ok(budgets)
    }

    /// Current state, as stored.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Poisoned`] if the lock is poisoned.
    pub fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    /// Change the refresh window of the budget at `index`.
    ///
    /// See [`Budget::reconfigure`] for how the baseline is kept.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NoSuchBudget`] for a bad index, plus the lock errors of
    /// [`authorize`](Self::authorize).
    pub fn reconfigure(
        &self,
        index: usize,
        refresh_window: u64,
        now: UnixSeconds,
    ) -> LedgerResult<LedgerSnapshot> {
        let mut state = self.lock_live()?;
        let count = state.budgets.len();
        let budget = state
            .budgets
            .get_mut(index)
            .ok_or(LedgerError::NoSuchBudget { index, count })?;
        if budget.reconfigure(refresh_window, now) {
            state.bump();
        }
        Ok(state.snapshot())
    }

    /// Mark the ledger as belonging to a deleted connection.
    ///
    /// Every later mutation fails with [`LedgerError::Retired`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::Poisoned`] if the lock is poisoned.
    pub fn retire(&self) -> LedgerResult<()> {
        self.lock()?.retired = true;
        Ok(())
    }

    /// Undo [`retire`](Self::retire) after a failed deletion.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Poisoned`] if the lock is poisoned.
    pub fn reinstate(&self) -> LedgerResult<()> {
        self.lock()?.retired = false;
        Ok(())
    }

    /// Whether the ledger has been retired.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.lock().map_or(true, |state| state.retired)
    }
}

impl fmt::Debug for BudgetLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lock() {
            Ok(state) => f
                .debug_struct("BudgetLedger")
                .field("budgets", &state.budgets)
                .field("last_used", &state.last_used)
                .field("revision", &state.revision)
                .field("retired", &state.retired)
                .finish(),
            Err(_) => f.debug_struct("BudgetLedger").finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::budget::REFRESH_DAY;

    const T0: UnixSeconds = 1_700_000_000;

    fn single(cap: Msats, window: u64) -> BudgetLedger {
        BudgetLedger::new(vec![Budget::new(cap, window, T0, T0)], 0)
    }

    #[test]
    fn test_allowed_returns_snapshot_and_stamps_last_used() {
        let ledger = single(100_000, REFRESH_DAY);
        let outcome = ledger.authorize(40_000, T0 + 5).unwrap();
        assert_eq!(outcome.decision, Decision::Allowed);
        let snap = outcome.snapshot.unwrap();
        assert_eq!(snap.budgets[0].used_msats, 40_000);
        assert_eq!(snap.last_used, T0 + 5);
        assert_eq!(snap.revision, 1);
    }

    #[test]
    fn test_denied_without_rollover_has_nothing_to_persist() {
        let ledger = single(100, REFRESH_DAY);
        let outcome = ledger.authorize(101, T0).unwrap();
        assert!(!outcome.decision.is_allowed());
        assert!(outcome.snapshot.is_none());
        assert_eq!(ledger.snapshot().unwrap().last_used, 0);
    }

    #[test]
    fn test_denied_with_rollover_persists_window() {
        let ledger = single(100, REFRESH_DAY);
        ledger.authorize(100, T0).unwrap();
        let outcome = ledger.authorize(101, T0 + REFRESH_DAY as i64).unwrap();
        assert!(!outcome.decision.is_allowed());
        let snap = outcome.snapshot.unwrap();
        assert_eq!(snap.budgets[0].used_msats, 0);
        assert_eq!(snap.revision, 2);
    }

    #[test]
    fn test_resolved_does_not_mutate() {
        let ledger = single(100, REFRESH_DAY);
        ledger.authorize(80, T0).unwrap();
        let resolved = ledger.resolved(T0 + 2 * REFRESH_DAY as i64).unwrap();
        assert_eq!(resolved[0].used_msats, 0);
        let stored = ledger.snapshot().unwrap();
        assert_eq!(stored.budgets[0].used_msats, 80);
        assert_eq!(stored.budgets[0].window_start, T0);
    }

    #[test]
    fn test_retired_ledger_refuses() {
        let ledger = single(100, 0);
        ledger.retire().unwrap();
        assert!(ledger.is_retired());
        assert!(matches!(ledger.authorize(1, T0), Err(LedgerError::Retired)));
        ledger.reinstate().unwrap();
        assert!(ledger.authorize(1, T0).unwrap().decision.is_allowed());
    }

    #[test]
    fn test_reconfigure_bad_index() {
        let ledger = single(100, 0);
        assert!(matches!(
            ledger.reconfigure(3, REFRESH_DAY, T0),
            Err(LedgerError::NoSuchBudget { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_reconfigure_bumps_revision() {
        let ledger = single(100, REFRESH_DAY);
        let snap = ledger.reconfigure(0, 3_600, T0 + 10).unwrap();
        assert_eq!(snap.revision, 1);
        assert_eq!(snap.budgets[0].refresh_window, 3_600);
        assert_eq!(snap.budgets[0].window_start, T0);
    }

    #[test]
    fn test_parallel_authorizations_never_overspend() {
        const N: usize = 32;
        const AMOUNT: Msats = 1_000;
        let ledger = Arc::new(single(AMOUNT * (N as u64 - 1), 0));
        let allowed = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|scope| {
            for _ in 0..N {
                let ledger = Arc::clone(&ledger);
                let allowed = Arc::clone(&allowed);
                scope.spawn(move || {
                    if ledger.authorize(AMOUNT, T0).unwrap().decision.is_allowed() {
                        allowed.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(allowed.load(Ordering::SeqCst), N - 1);
        let snap = ledger.snapshot().unwrap();
        assert_eq!(snap.budgets[0].used_msats, snap.budgets[0].budget_msats);
    }
}
