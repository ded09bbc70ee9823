//! Wall-clock abstraction
//!
//! New drops are stamped with the host's notion of time. Production code
//! uses the chrono-backed [`SystemClock`]; tests pin time with a
//! [`ManualClock`].

use crate::types::Timestamp;

/// Source of creation timestamps
pub trait Clock: Send + Sync {
    /// Current time in whole seconds since the Unix epoch
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock for deterministic tests
pub struct ManualClock {
    now: parking_lot::Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: parking_lot::Mutex::new(start),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }

    /// Move forward by `seconds`
    pub fn advance(&self, seconds: i64) {
        *self.now.lock() += seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
