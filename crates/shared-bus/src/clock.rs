//! Time sources for nodes.
//!
//! Timestamps are milliseconds since the run started, not wall-clock time.

use shared_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Time source abstraction so services can be tested with a fixed clock.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since the run started.
    fn now_millis(&self) -> Timestamp;
}

/// Clock anchored at the moment it was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn starting_now() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::starting_now()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> Timestamp {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn at(millis: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(millis),
        }
    }

    pub fn set(&self, millis: Timestamp) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
