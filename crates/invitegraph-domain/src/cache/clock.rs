//! Time source for cache expiry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of the current instant used for TTL checks.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Used in tests.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_millis: AtomicU64,
}

impl ManualClock {
    /// Furthest the clock can be advanced past its creation: about 100 years.
    pub const MAX_OFFSET: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_millis: AtomicU64::new(0),
        }
    }

    /// Moves the clock forward by `by`, in whole milliseconds.
    ///
    /// The offset saturates at [`ManualClock::MAX_OFFSET`] instead of
    /// wrapping, which keeps [`Clock::now`] within the range of `Instant`.
    pub fn advance(&self, by: Duration) {
        let cap = Self::max_offset_millis();
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        // The closure never returns None, so the update always succeeds.
        let _ = self
            .offset_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(millis).min(cap))
            });
    }

    fn max_offset_millis() -> u64 {
        u64::try_from(Self::MAX_OFFSET.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }
}
