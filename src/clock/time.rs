use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time as seen by the clock scheduler and the stop watchdog
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl TimeSource for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced time for simulations and tests
#[derive(Debug)]
pub struct ManualTime {
    now: Mutex<Instant>,
}

impl ManualTime {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *crate::lock(&self.now) += by;
    }
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        *crate::lock(&self.now)
    }
}
