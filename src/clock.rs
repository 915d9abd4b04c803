//! Clock primitive consumed by the sale engine.
//!
//! Time is an external input read once per logical call, mirroring a block
//! timestamp. The engine never polls a live clock mid-call.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Timestamp;

/// Source of "now" for the engine.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp() as u64
    }
}

/// Manually driven clock for tests and simulations.
///
/// The native counterpart of a test chain's time-travel helper: set or
/// advance the timestamp, then issue calls against it.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `seconds`.
    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
