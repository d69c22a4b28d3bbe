//! Time sources.
//!
//! Every component that compares against "now" takes a [`Clock`] so rollover
//! and expiry can be driven deterministically in tests.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::types::UnixSeconds;

/// A source of the current wall-clock time in whole seconds.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time as Unix seconds.
    fn now(&self) -> UnixSeconds;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixSeconds {
        chrono::Utc::now().timestamp()
    }
}

/// A manually driven clock.
///
/// # Example
///
/// ```
/// use nwc_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000);
/// clock.advance(86_401);
/// assert_eq!(clock.now(), 87_401);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: UnixSeconds) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: UnixSeconds) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UnixSeconds {
        self.now.load(Ordering::SeqCst)
    }
}
