//! Monophonic note tracking for sound-producing nodes

use crate::event::{Event, EventKind};
use log::{debug, trace};

/// What a note event did to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteChange {
    /// A note started sounding (replacing any previous one)
    Started(u8),
    /// The current note was released
    Released,
    /// Not a note event, filtered out, or missing its payload
    Ignored,
}

/// Tracks the single note a synth node is currently sounding.
#[derive(Debug, Clone, Default)]
pub struct NoteConsumer {
    current: Option<u8>,
    in_channels: Vec<u8>,
    notes_started: u64,
}

impl NoteConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only react to these channels. An empty list accepts every channel.
    pub fn with_channels(mut self, channels: impl IntoIterator<Item = u8>) -> Self {
        self.in_channels = channels.into_iter().collect();
        self
    }

    pub fn apply(&mut self, event: &Event) -> NoteChange {
        if !matches!(event.kind, EventKind::NoteOn | EventKind::NoteOff) {
            return NoteChange::Ignored;
        }
        if !self.accepts(event.channel) {
            trace!("Note on channel {:?} filtered out", event.channel);
            return NoteChange::Ignored;
        }

        if event.is_note_off() {
            self.current = None;
            return NoteChange::Released;
        }

        match (event.note, event.velocity) {
            (Some(note), Some(_)) => {
                self.current = Some(note);
                self.notes_started += 1;
                NoteChange::Started(note)
            }
            _ => {
                debug!("Ignoring note-on without note or velocity");
                NoteChange::Ignored
            }
        }
    }

    // Events without a channel are let through rather than dropped
    fn accepts(&self, channel: Option<u8>) -> bool {
        match channel {
            Some(ch) => self.in_channels.is_empty() || self.in_channels.contains(&ch),
            None => true,
        }
    }

    pub fn current_note(&self) -> Option<u8> {
        self.current
    }

    pub fn notes_started(&self) -> u64 {
        self.notes_started
    }

    pub fn in_channels(&self) -> &[u8] {
        &self.in_channels
    }
}
