//! Time sources.
//!
//! The core never reads the wall clock on its own: every timelock check takes
//! `now` as an argument. A [`Clock`] is only used by convenience constructors
//! and by hosts that need to produce that `now`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::Timestamp;

/// Source of the current time in UNIX seconds.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time via `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch clocks clamp to zero.
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: Timestamp) {
        self.0.store(now, Ordering::SeqCst);
    }

    /// Saturates at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        // The closure never returns `None`, so the update always applies.
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(secs))
            });
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0.load(Ordering::SeqCst)
    }
}
