pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod consumer;
pub mod error;
pub mod event;
pub mod frame_loop;
pub mod logging;
pub mod node;
pub mod scheduler;
pub mod sequencer;
pub mod sync;
pub mod transport;
pub mod ui;

pub use clock::{BpmRange, ClockGenerator, ClockState, TimeSource};
pub use config::{Settings, Topology};
pub use consumer::{NoteChange, NoteConsumer};
pub use error::{PatchError, Result};
pub use event::{Event, EventKind, PULSES_PER_QUARTER};
pub use node::{Behavior, Cue, Monitor, Node, NodeOptions, Reactions, Visualizer};
pub use sequencer::{Pattern, StepClock, StepInput, StepSequencer, Trigger, Voice, VoiceId};
pub use sync::{SyncOutcome, SyncState, SyncStatus};
pub use transport::{EventSink, LoopbackBus, Transport, TransportStats, UdpConfig, UdpTransport};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, carrying on with the inner value if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
