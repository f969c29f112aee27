use crate::consumer::{NoteChange, NoteConsumer};
use crate::event::{Event, EventKind};
use crate::sequencer::{StepInput, StepSequencer, Trigger};
use crate::sync::{SyncOutcome, SyncState};
use std::collections::HashMap;

/// Something the presentation layer should make audible or visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A sequencer voice fired
    Step(Trigger),
    /// A note started sounding or flashed on screen
    Note { note: u8, velocity: u8 },
    /// A quarter-note boundary; carries the running beat count
    Beat(u64),
}

/// Side effects collected while a behavior handles one event or frame
#[derive(Debug, Default)]
pub struct Reactions {
    pub(crate) cues: Vec<Cue>,
    pub(crate) outgoing: Vec<Event>,
}

impl Reactions {
    pub fn cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    /// Queue an event for the other nodes; it is sent once the node lock is
    /// released.
    pub fn emit(&mut self, event: Event) {
        self.outgoing.push(event);
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn outgoing(&self) -> &[Event] {
        &self.outgoing
    }
}

/// Node-specific reaction to events that made it through the sync layer.
///
/// Called with the node lock held, so implementations must return quickly and
/// must not block.
pub trait Behavior: Send + 'static {
    fn handle(
        &mut self,
        event: &Event,
        outcome: SyncOutcome,
        sync: &SyncState,
        out: &mut Reactions,
    );

    /// Called once per application frame while the node is enabled
    fn frame(&mut self, _sync: &SyncState, _out: &mut Reactions) {}
}

fn fire(triggers: Vec<Trigger>, out: &mut Reactions) {
    for trigger in triggers {
        if trigger.notify_peers {
            out.emit(trigger.to_event());
        }
        out.cue(Cue::Step(trigger));
    }
}

impl Behavior for StepSequencer {
    fn handle(
        &mut self,
        _event: &Event,
        outcome: SyncOutcome,
        sync: &SyncState,
        out: &mut Reactions,
    ) {
        let triggers = match outcome {
            SyncOutcome::Started => self.start(),
            SyncOutcome::Pulse => self.advance(StepInput::Pulse {
                pulse_count: sync.pulse_count(),
                running: sync.is_running(),
            }),
            _ => return,
        };
        fire(triggers, out);
    }

    fn frame(&mut self, _sync: &SyncState, out: &mut Reactions) {
        let triggers = self.advance(StepInput::Frame);
        fire(triggers, out);
    }
}

impl Behavior for NoteConsumer {
    fn handle(
        &mut self,
        event: &Event,
        _outcome: SyncOutcome,
        _sync: &SyncState,
        out: &mut Reactions,
    ) {
        if let NoteChange::Started(note) = self.apply(event) {
            out.cue(Cue::Note {
                note,
                velocity: event.velocity.unwrap_or_default(),
            });
        }
    }
}

/// Counts what arrives; used by the clock master and the monitor node
#[derive(Debug, Default, Clone)]
pub struct Monitor {
    counts: HashMap<EventKind, u64>,
    last: Option<Event>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn last(&self) -> Option<&Event> {
        self.last.as_ref()
    }
}

impl Behavior for Monitor {
    fn handle(
        &mut self,
        event: &Event,
        _outcome: SyncOutcome,
        _sync: &SyncState,
        _out: &mut Reactions,
    ) {
        *self.counts.entry(event.kind).or_insert(0) += 1;
        self.last = Some(*event);
    }
}
