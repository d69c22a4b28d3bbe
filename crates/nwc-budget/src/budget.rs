//! A single spending cap and the rollover rule.
//!
//! A budget with `refresh_window > 0` resets on a fixed grid anchored at its
//! original `window_start`. When `k` whole windows have elapsed they are
//! collapsed in one step: `window_start` advances by `k * refresh_window` and
//! `used_msats` goes back to zero, whatever `k` is.

use nwc_core::{Msats, UnixSeconds};
use serde::{Deserialize, Serialize};

use crate::decision::{Decision, Evaluation};

/// One day, in seconds.
pub const REFRESH_DAY: u64 = 86_400;
/// One week, in seconds.
pub const REFRESH_WEEK: u64 = 604_800;
/// Thirty days, in seconds.
pub const REFRESH_MONTH: u64 = 2_592_000;
/// 365 days, in seconds.
pub const REFRESH_YEAR: u64 = 31_536_000;

/// A spending cap attached to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Cap for one accounting period.
    pub budget_msats: Msats,
    /// Consumed in the current period.
    pub used_msats: Msats,
    /// Period length in seconds; `0` never resets.
    pub refresh_window: u64,
    /// Start of the current period.
    pub window_start: UnixSeconds,
    /// When the budget was defined.
    pub created_at: UnixSeconds,
}

impl Budget {
    /// A fresh budget whose first period starts at `now`.
    #[must_use]
    pub fn new(
        budget_msats: Msats,
        refresh_window: u64,
        created_at: UnixSeconds,
        now: UnixSeconds,
    ) -> Self {
        Self {
            budget_msats,
            used_msats: 0,
            refresh_window,
            window_start: now,
            created_at,
        }
    }

    /// Whether this is a lifetime cap.
    #[must_use]
    pub fn is_lifetime(&self) -> bool {
        self.refresh_window == 0
    }

    /// Short label for the well-known windows.
    #[must_use]
    pub fn window_label(&self) -> Option<&'static str> {
        match self.refresh_window {
            0 => Some("lifetime"),
            REFRESH_DAY => Some("daily"),
            REFRESH_WEEK => Some("weekly"),
            REFRESH_MONTH => Some("monthly"),
            REFRESH_YEAR => Some("yearly"),
            _ => None,
        }
    }

    /// Apply the rollover rule at `now`. Returns whether anything changed.
    ///
    /// Idempotent for a fixed `now`. A `now` earlier than `window_start`
    /// (clock skew) leaves the budget untouched.
    pub fn rollover(&mut self, now: UnixSeconds) -> bool {
        if self.is_lifetime() || now < self.window_start {
            return false;
        }
        let Some(elapsed) = now.checked_sub(self.window_start) else {
            return false;
        };
        let elapsed = elapsed.unsigned_abs();
        if elapsed < self.refresh_window {
            return false;
        }

        let advanced = elapsed
            .checked_div(self.refresh_window)
            .and_then(|periods| periods.checked_mul(self.refresh_window))
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| self.window_start.checked_add(secs));
        // Out-of-range grids fall back to re-anchoring at `now`.
        self.window_start = advanced.unwrap_or(now);
        self.used_msats = 0;
        true
    }

    /// Remaining headroom in the current period (as stored).
    #[must_use]
    pub fn remaining(&self) -> Msats {
        self.budget_msats.saturating_sub(self.used_msats)
    }

    /// Whether `amount` fits the current period.
    #[must_use]
    pub fn has_headroom(&self, amount: Msats) -> bool {
        self.used_msats
            .checked_add(amount)
            .is_some_and(|total| total <= self.budget_msats)
    }

    /// How far `amount` overshoots the current period.
    #[must_use]
    pub fn shortfall(&self, amount: Msats) -> Msats {
        self.used_msats
            .saturating_add(amount)
            .saturating_sub(self.budget_msats)
    }

    /// Change the window length.
    ///
    /// Pending rollovers are applied under the old window first. The
    /// resulting `window_start` and `used_msats` are kept and the new length
    /// takes effect from that baseline.
    pub fn reconfigure(&mut self, refresh_window: u64, now: UnixSeconds) -> bool {
        let rolled = self.rollover(now);
        let changed = self.refresh_window != refresh_window;
        self.refresh_window = refresh_window;
        rolled || changed
    }

    /// End of the current period, if the budget resets.
    #[must_use]
    pub fn next_reset(&self) -> Option<UnixSeconds> {
        if self.is_lifetime() {
            return None;
        }
        i64::try_from(self.refresh_window)
            .ok()
            .and_then(|window| self.window_start.checked_add(window))
    }
}

/// Authorize `amount` against every budget in `budgets` at `now`.
///
/// Every budget is rolled forward first, even when the request is refused.
/// The amount is charged to all budgets or to none. An empty set is
/// unrestricted.
pub fn authorize_budgets(budgets: &mut [Budget], amount: Msats, now: UnixSeconds) -> Evaluation {
    let mut mutated = false;
    for budget in budgets.iter_mut() {
        mutated |= budget.rollover(now);
    }

    if let Some((index, budget)) = budgets
        .iter()
        .enumerate()
        .find(|(_, budget)| !budget.has_headroom(amount))
    {
        return Evaluation {
            decision: Decision::Denied {
                budget: index,
                shortfall_msats: budget.shortfall(amount),
            },
            mutated,
        };
    }

    if amount > 0 && !budgets.is_empty() {
        for budget in budgets.iter_mut() {
            budget.used_msats = budget.used_msats.saturating_add(amount);
        }
        mutated = true;
    }

    Evaluation {
        decision: Decision::Allowed,
        mutated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: UnixSeconds = 1_700_000_000;

    fn daily(cap: Msats) -> Budget {
        Budget::new(cap, REFRESH_DAY, T0, T0)
    }

    #[test]
    fn test_new_budget_starts_empty_at_now() {
        let b = Budget::new(5_000, REFRESH_WEEK, T0 - 10, T0);
        assert_eq!(b.used_msats, 0);
        assert_eq!(b.window_start, T0);
        assert_eq!(b.created_at, T0 - 10);
        assert_eq!(b.window_label(), Some("weekly"));
    }

    #[test]
    fn test_rollover_before_window_ends_is_noop() {
        let mut b = daily(100);
        b.used_msats = 60;
        assert!(!b.rollover(T0 + 86_399));
        assert_eq!(b.used_msats, 60);
        assert_eq!(b.window_start, T0);
    }

    #[test]
    fn test_rollover_at_boundary() {
        let mut b = daily(100);
        b.used_msats = 60;
        assert!(b.rollover(T0 + 86_400));
        assert_eq!(b.used_msats, 0);
        assert_eq!(b.window_start, T0 + 86_400);
    }

    #[test]
    fn test_rollover_is_idempotent() {
        let mut b = daily(100);
        b.used_msats = 60;
        let now = T0 + 90_000;
        assert!(b.rollover(now));
        let after_first = b.clone();
        assert!(!b.rollover(now));
        assert_eq!(b, after_first);
    }

    #[test]
    fn test_rollover_catches_up_many_periods_on_grid() {
        for k in [1_i64, 2, 7, 365] {
            let mut b = daily(100);
            b.used_msats = 99;
            let now = T0 + k * 86_400 + 1_234;
            assert!(b.rollover(now));
            assert_eq!(b.used_msats, 0);
            assert_eq!(b.window_start, T0 + k * 86_400);
            assert!(b.window_start <= now);
        }
    }

    #[test]
    fn test_arbitrary_window_length() {
        let mut b = Budget::new(100, 90, T0, T0);
        b.used_msats = 10;
        assert!(b.rollover(T0 + 275));
        assert_eq!(b.window_start, T0 + 270);
        assert_eq!(b.window_label(), None);
    }

    #[test]
    fn test_lifetime_budget_never_resets() {
        let mut b = Budget::new(100, 0, T0, T0);
        b.used_msats = 100;
        assert!(!b.rollover(T0 + 100 * 31_536_000));
        assert_eq!(b.used_msats, 100);
        assert_eq!(b.next_reset(), None);
    }

    #[test]
    fn test_clock_skew_leaves_budget_untouched() {
        let mut b = daily(100);
        b.used_msats = 50;
        assert!(!b.rollover(T0 - 1_000_000));
        assert_eq!(b.used_msats, 50);
    }

    #[test]
    fn test_headroom_and_shortfall() {
        let mut b = daily(100_000);
        b.used_msats = 40_000;
        assert!(b.has_headroom(60_000));
        assert!(!b.has_headroom(70_000));
        assert_eq!(b.shortfall(70_000), 10_000);
        assert_eq!(b.remaining(), 60_000);
        assert!(!b.has_headroom(u64::MAX));
    }

    #[test]
    fn test_conjunctive_denial_charges_nothing() {
        let mut budgets = vec![daily(1_000), Budget::new(100, 0, T0, T0)];
        budgets[1].used_msats = 90;
        let eval = authorize_budgets(&mut budgets, 50, T0 + 10);
        assert_eq!(
            eval.decision,
            Decision::Denied {
                budget: 1,
                shortfall_msats: 40
            }
        );
        assert!(!eval.mutated);
        assert_eq!(budgets[0].used_msats, 0);
        assert_eq!(budgets[1].used_msats, 90);
    }

    #[test]
    fn test_allowed_charges_every_budget() {
        let mut budgets = vec![daily(1_000), Budget::new(500, REFRESH_WEEK, T0, T0)];
        let eval = authorize_budgets(&mut budgets, 200, T0);
        assert_eq!(eval.decision, Decision::Allowed);
        assert!(eval.mutated);
        assert!(budgets.iter().all(|b| b.used_msats == 200));
    }

    #[test]
    fn test_denied_request_still_rolls_forward() {
        let mut budgets = vec![daily(100)];
        budgets[0].used_msats = 100;
        let eval = authorize_budgets(&mut budgets, 150, T0 + 86_400);
        assert!(!eval.decision.is_allowed());
        assert!(eval.mutated);
        assert_eq!(budgets[0].window_start, T0 + 86_400);
        assert_eq!(budgets[0].used_msats, 0);
    }

    #[test]
    fn test_empty_budget_set_is_unrestricted() {
        let mut budgets: Vec<Budget> = Vec::new();
        let eval = authorize_budgets(&mut budgets, u64::MAX, T0);
        assert_eq!(eval.decision, Decision::Allowed);
        assert!(!eval.mutated);
    }

    #[test]
    fn test_reconfigure_preserves_baseline() {
        let mut b = daily(100);
        b.used_msats = 30;
        assert!(b.reconfigure(REFRESH_WEEK, T0 + 3_600));
        assert_eq!(b.window_start, T0);
        assert_eq!(b.used_msats, 30);
        assert_eq!(b.refresh_window, REFRESH_WEEK);
        assert_eq!(b.next_reset(), Some(T0 + 604_800));
    }

    #[test]
    fn test_reconfigure_rolls_under_old_window_first() {
        let mut b = daily(100);
        b.used_msats = 30;
        b.reconfigure(REFRESH_WEEK, T0 + 2 * 86_400 + 5);
        assert_eq!(b.window_start, T0 + 2 * 86_400);
        assert_eq!(b.used_msats, 0);
    }

    #[test]
    fn test_budget_serde_field_names() {
        let json = serde_json::to_value(daily(100)).unwrap();
        assert_eq!(json["budget_msats"], 100);
        assert_eq!(json["refresh_window"], 86_400);
        assert_eq!(json["window_start"], T0);
    }
}
