//! Commit timestamps.
//!
//! Commit times are wall-clock milliseconds, but every commit is stamped
//! strictly later than the one before it. If the wall clock stalls or
//! steps backwards the ledger runs one millisecond ahead of the previous
//! commit until real time catches up, so commit order is time order even
//! without the record-id tiebreak.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time in milliseconds since the UNIX epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// The operating system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Used by tests and by tools that
/// need reproducible commit times.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Time to stamp on the next commit given the previous commit time.
pub fn next_commit_time(clock: &dyn Clock, previous: Option<u64>) -> u64 {
    let now = clock.now_ms();
    match previous {
        Some(prev) if prev >= now => prev.saturating_add(1),
        _ => now,
    }
}
