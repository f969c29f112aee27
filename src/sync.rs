//! Receiver-side synchronization state machine
//!
//! Each node keeps a [`SyncState`] that only inbound CLOCK, START and STOP events
//! change. Everything downstream (sequencers, consumers, the status line) reads
//! it after the event has been applied.

use crate::event::{Event, EventKind, PULSES_PER_QUARTER};
use std::fmt;

/// What the presentation layer shows for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    WaitingForSync,
    Stopped,
    Running,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncStatus::WaitingForSync => "WAITING FOR SYNC",
            SyncStatus::Stopped => "STOPPED",
            SyncStatus::Running => "RUNNING",
        })
    }
}

/// How an inbound event affected the sync state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Node disabled; nothing was touched and the event goes no further
    Dropped,
    Pulse,
    Started,
    Stopped,
    /// Not a transport event; forwarded untouched
    PassThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    synced: bool,
    running: bool,
    pulse_count: u8,
    enabled: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            synced: false,
            running: false,
            pulse_count: 0,
            enabled: true,
        }
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &Event) -> SyncOutcome {
        if !self.enabled {
            return SyncOutcome::Dropped;
        }

        match event.kind {
            EventKind::Clock => {
                self.synced = true;
                self.pulse_count = (self.pulse_count + 1) % PULSES_PER_QUARTER;
                SyncOutcome::Pulse
            }
            EventKind::Start => {
                self.running = true;
                self.pulse_count = 0;
                SyncOutcome::Started
            }
            EventKind::Stop => {
                self.running = false;
                self.pulse_count = 0;
                SyncOutcome::Stopped
            }
            _ => SyncOutcome::PassThrough,
        }
    }

    /// Used by the stop watchdog when the master's STOP never arrived
    pub fn force_stop(&mut self) {
        self.running = false;
        self.pulse_count = 0;
    }

    pub fn status(&self) -> SyncStatus {
        if !self.synced {
            SyncStatus::WaitingForSync
        } else if !self.running {
            SyncStatus::Stopped
        } else {
            SyncStatus::Running
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pulse_count(&self) -> u8 {
        self.pulse_count
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
