// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! The ledger's notion of "now"
//!
//! Election phases are a pure function of the election window and the ledger time, so every
//! component reads time from the same [`Clock`] rather than from the operating system directly.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use time::OffsetDateTime;

use crate::data::Timestamp;

/// Source of ledger time
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current ledger time in seconds since the unix epoch
    fn now(&self) -> Timestamp;
}

/// Wall-clock time
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch system time is clamped to zero.
        u64::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or_default()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same underlying time, so a test can hold one copy and hand another to the
/// ledger.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    /// The current time
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock stopped at `now`
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    /// Move the clock to `now`
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `seconds`, saturating at `u64::MAX`
    pub fn advance(&self, seconds: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(seconds))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let ledger_view = clock.clone();
        clock.advance(10);
        assert_eq!(ledger_view.now(), 1_010);
        clock.set(5);
        assert_eq!(ledger_view.now(), 5);
        clock.set(u64::MAX - 1);
        clock.advance(10);
        assert_eq!(ledger_view.now(), u64::MAX);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
