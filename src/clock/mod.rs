//! Master clock generation
//!
//! The clock master owns the tempo and broadcasts START, STOP and a CLOCK pulse
//! every `60 / bpm / 24` seconds. It is polled from the host frame loop rather
//! than running its own timer thread; see [`ClockGenerator::tick`] for how the
//! schedule stays on the ideal pulse grid regardless of polling jitter.

mod generator;
mod time;

pub use generator::{ClockGenerator, ClockState};
pub use time::{ManualTime, MonotonicClock, TimeSource};

use crate::config::{MAX_BPM, MIN_BPM};
use crate::event::PULSES_PER_QUARTER;
use std::time::Duration;

/// Inclusive tempo bounds. Requests outside are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmRange {
    min: f64,
    max: f64,
}

impl BpmRange {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, bpm: f64) -> f64 {
        bpm.clamp(self.min, self.max)
    }
}

impl Default for BpmRange {
    fn default() -> Self {
        Self::new(MIN_BPM, MAX_BPM)
    }
}

/// Time between two CLOCK pulses at `bpm`
pub fn clock_interval(bpm: f64) -> Duration {
    Duration::from_secs_f64(60.0 / bpm / f64::from(PULSES_PER_QUARTER))
}
