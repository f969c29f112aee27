//! A node: transport, sync state machine and behavior wired together
//!
//! Inbound events arrive on the transport's listener thread and run through
//! [`SyncState::apply`] and then the node's [`Behavior`]. The application frame
//! loop toggles `enabled`, edits patterns and drains [`Cue`]s. Both sides go
//! through the same per-node mutex.

mod behavior;
mod visualizer;

pub use behavior::{Behavior, Cue, Monitor, Reactions};
pub use visualizer::Visualizer;

use crate::clock::{MonotonicClock, TimeSource};
use crate::error::Result;
use crate::event::Event;
use crate::lock;
use crate::sync::{SyncOutcome, SyncState, SyncStatus};
use crate::transport::{EventSink, Transport, TransportStats};
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub struct NodeOptions {
    /// Stop a running node that has heard no clock pulse for this long
    pub stop_timeout: Option<Duration>,
    pub time: Arc<dyn TimeSource>,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            stop_timeout: None,
            time: Arc::new(MonotonicClock),
        }
    }
}

struct NodeCore<B> {
    sync: SyncState,
    behavior: B,
    /// Last START or CLOCK seen, for the stop watchdog
    last_activity: Option<Instant>,
}

struct Shared<B> {
    name: String,
    core: Mutex<NodeCore<B>>,
    cue_tx: Sender<Cue>,
    time: Arc<dyn TimeSource>,
    stop_timeout: Option<Duration>,
}

impl<B: Behavior> Shared<B> {
    /// Applies one event and returns the events the behavior wants sent.
    fn process(&self, event: &Event) -> Vec<Event> {
        let mut reactions = Reactions::default();
        {
            let mut core = lock(&self.core);
            let outcome = core.sync.apply(event);
            match outcome {
                SyncOutcome::Dropped => return Vec::new(),
                SyncOutcome::Pulse | SyncOutcome::Started => {
                    core.last_activity = Some(self.time.now());
                }
                SyncOutcome::Stopped => core.last_activity = None,
                SyncOutcome::PassThrough => {}
            }
            if outcome == SyncOutcome::Started || outcome == SyncOutcome::Stopped {
                info!("Node '{}' {}", self.name, core.sync.status());
            }

            let NodeCore { sync, behavior, .. } = &mut *core;
            behavior.handle(event, outcome, sync, &mut reactions);
        }
        self.publish(reactions)
    }

    fn frame(&self) -> Vec<Event> {
        let mut reactions = Reactions::default();
        {
            let mut core = lock(&self.core);
            if !core.sync.is_enabled() {
                return Vec::new();
            }
            self.check_watchdog(&mut core);

            let NodeCore { sync, behavior, .. } = &mut *core;
            behavior.frame(sync, &mut reactions);
        }
        self.publish(reactions)
    }

    fn check_watchdog(&self, core: &mut NodeCore<B>) {
        let (Some(timeout), Some(last)) = (self.stop_timeout, core.last_activity) else {
            return;
        };
        if core.sync.is_running() && self.time.now().saturating_duration_since(last) > timeout {
            warn!(
                "Node '{}' heard no clock for {:?}, assuming a lost STOP",
                self.name, timeout
            );
            core.sync.force_stop();
            core.last_activity = None;
        }
    }

    fn publish(&self, reactions: Reactions) -> Vec<Event> {
        for cue in reactions.cues {
            // Only fails once the node itself is gone
            let _ = self.cue_tx.send(cue);
        }
        reactions.outgoing
    }
}

/// One participant on the shared event channel.
pub struct Node<B: Behavior> {
    shared: Arc<Shared<B>>,
    transport: Arc<dyn Transport>,
    cues: Receiver<Cue>,
}

impl<B: Behavior> Node<B> {
    /// Registers the node's event callback with `transport` and starts
    /// listening.
    pub fn start(
        name: impl Into<String>,
        behavior: B,
        transport: Arc<dyn Transport>,
        options: NodeOptions,
    ) -> Result<Self> {
        let name = name.into();
        let (cue_tx, cues) = unbounded();
        let shared = Arc::new(Shared {
            name: name.clone(),
            core: Mutex::new(NodeCore {
                sync: SyncState::new(),
                behavior,
                last_activity: None,
            }),
            cue_tx,
            time: options.time,
            stop_timeout: options.stop_timeout,
        });

        let callback_shared = shared.clone();
        let outbound = Arc::downgrade(&transport);
        transport.listen(Box::new(move |event| {
            let outgoing = callback_shared.process(&event);
            if outgoing.is_empty() {
                return;
            }
            if let Some(transport) = outbound.upgrade() {
                for event in &outgoing {
                    transport.send(event);
                }
            }
        }))?;

        info!("Node '{}' joined as '{}'", name, transport.source());
        Ok(Self {
            shared,
            transport,
            cues,
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn send_event(&self, event: &Event) {
        self.transport.send(event);
    }

    /// Runs a locally generated event through the same pipeline as a received
    /// one, e.g. a note played from the keyboard.
    pub fn deliver_local(&self, event: Event) {
        for outgoing in self.shared.process(&event) {
            self.transport.send(&outgoing);
        }
    }

    /// Per-frame housekeeping: stop watchdog and frame-driven behaviors
    pub fn frame(&self) {
        for outgoing in self.shared.frame() {
            self.transport.send(&outgoing);
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        lock(&self.shared.core).sync.set_enabled(enabled);
        debug!("Node '{}' enabled: {}", self.shared.name, enabled);
    }

    pub fn toggle_enabled(&self) -> bool {
        let mut core = lock(&self.shared.core);
        let enabled = !core.sync.is_enabled();
        core.sync.set_enabled(enabled);
        debug!("Node '{}' enabled: {}", self.shared.name, enabled);
        enabled
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.shared.core).sync.is_enabled()
    }

    pub fn status(&self) -> SyncStatus {
        lock(&self.shared.core).sync.status()
    }

    pub fn sync_state(&self) -> SyncState {
        lock(&self.shared.core).sync
    }

    /// Locked access to the behavior, for pattern edits and display
    pub fn with_behavior<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut lock(&self.shared.core).behavior)
    }

    /// Everything cued since the last call
    pub fn drain_cues(&self) -> Vec<Cue> {
        self.cues.try_iter().collect()
    }

    pub fn transport_stats(&self) -> TransportStats {
        self.transport.stats()
    }

    pub fn shutdown(&self) {
        self.transport.close();
    }
}

impl<B: Behavior> EventSink for Node<B> {
    fn send(&self, event: &Event) {
        self.send_event(event);
    }
}

impl<B: Behavior> Drop for Node<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
