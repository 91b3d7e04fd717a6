//! Time sources for maturity checks.
//!
//! Maturity is evaluated lazily by comparing a lockup's `unlock_at` with
//! [`TimeSource::now`]; nothing is scheduled. Tests inject a
//! [`SharedMockTimeSource`] and move time forward explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::Timestamp;

pub trait TimeSource {
    /// Current unix time in seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually driven time source. Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct SharedMockTimeSource {
    now: Arc<AtomicU64>,
}

impl SharedMockTimeSource {
    /// Starts at an arbitrary non-zero instant so `created_at` is meaningful.
    pub fn new() -> Self {
        Self::starting_at(1_700_000_000)
    }

    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_secs(), Ordering::SeqCst);
    }

    pub fn set(&self, to: Timestamp) {
        self.now.store(to, Ordering::SeqCst);
    }
}

impl TimeSource for SharedMockTimeSource {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
