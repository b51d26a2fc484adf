//! Time source for priority stamps.

use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies the current time in Unix milliseconds.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        i64::try_from(millis).unwrap_or(i64::MAX)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<i64>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    pub fn new(start: i64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Sets the current time.
    pub fn set(&self, millis: i64) {
        *self.now.lock() = millis;
    }

    /// Moves the clock forward.
    pub fn advance(&self, millis: i64) {
        *self.now.lock() += millis;
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        *self.now.lock()
    }
}
