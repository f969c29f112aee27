use super::{clock_interval, BpmRange, TimeSource};
use crate::event::{Event, PULSES_PER_QUARTER};
use crate::transport::EventSink;
use log::{debug, info, trace};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Generates the master CLOCK pulse at a configurable tempo
#[derive(Debug)]
pub struct ClockGenerator {
    bpm: f64,
    range: BpmRange,
    interval: Duration,
    state: ClockState,
    pulse_count: u8,
    next_due: Option<Instant>,
    pulses_emitted: u64,
}

impl ClockGenerator {
    pub fn new(bpm: f64, range: BpmRange) -> Self {
        let bpm = if bpm.is_finite() {
            range.clamp(bpm)
        } else {
            range.min()
        };
        info!("Creating clock generator at {} BPM", bpm);
        Self {
            bpm,
            range,
            interval: clock_interval(bpm),
            state: ClockState::Stopped,
            pulse_count: 0,
            next_due: None,
            pulses_emitted: 0,
        }
    }

    /// Broadcasts START and anchors the pulse grid at `now`.
    ///
    /// Calling this while already running restarts the grid.
    pub fn start(&mut self, now: Instant, sink: &dyn EventSink) {
        sink.send(&Event::start());
        self.state = ClockState::Running;
        self.pulse_count = 0;
        self.next_due = Some(now);
        info!("Clock started at {} BPM", self.bpm);
    }

    pub fn stop(&mut self, sink: &dyn EventSink) {
        sink.send(&Event::stop());
        self.state = ClockState::Stopped;
        self.pulse_count = 0;
        self.next_due = None;
        info!("Clock stopped after {} pulses", self.pulses_emitted);
    }

    /// Start when stopped, stop when running
    pub fn toggle(&mut self, now: Instant, sink: &dyn EventSink) {
        match self.state {
            ClockState::Stopped => self.start(now, sink),
            ClockState::Running => self.stop(sink),
        }
    }

    /// Emits every pulse that has fallen due by `now` and returns how many.
    ///
    /// The next deadline is advanced by exactly one interval per pulse instead
    /// of being reset to `now`, so late polls catch up in a burst and the
    /// long-run pulse count tracks elapsed time without accumulating drift.
    pub fn tick(&mut self, now: Instant, sink: &dyn EventSink) -> usize {
        if self.state != ClockState::Running {
            return 0;
        }
        let Some(mut due) = self.next_due else {
            return 0;
        };

        let mut emitted = 0;
        while now >= due {
            sink.send(&Event::clock());
            self.pulse_count = (self.pulse_count + 1) % PULSES_PER_QUARTER;
            self.pulses_emitted += 1;
            due += self.interval;
            emitted += 1;
        }
        self.next_due = Some(due);

        if emitted > 1 {
            trace!("Caught up {} pulses in one tick", emitted);
        }
        emitted
    }

    /// [`tick`](Self::tick) using the given time source
    pub fn poll(&mut self, time: &dyn TimeSource, sink: &dyn EventSink) -> usize {
        self.tick(time.now(), sink)
    }

    /// Changes tempo, clamped to the configured range. Non-finite values are
    /// ignored. The pending deadline is left alone; spacing changes from the
    /// pulse after it.
    pub fn set_bpm(&mut self, bpm: f64) {
        if !bpm.is_finite() {
            debug!("Ignoring non-finite BPM request");
            return;
        }
        let clamped = self.range.clamp(bpm);
        if clamped != bpm {
            debug!("BPM {} clamped to {}", bpm, clamped);
        }
        self.bpm = clamped;
        self.interval = clock_interval(clamped);
    }

    /// Relative tempo change, as from a drag gesture
    pub fn nudge_bpm(&mut self, delta: f64) {
        self.set_bpm(self.bpm + delta);
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn pulse_count(&self) -> u8 {
        self.pulse_count
    }

    pub fn pulses_emitted(&self) -> u64 {
        self.pulses_emitted
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }
}
