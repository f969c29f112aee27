use super::{Behavior, Cue, Reactions};
use crate::event::{Event, EventKind};
use crate::sync::{SyncOutcome, SyncState};
use log::trace;

/// Flash intensity kept from one frame to the next
pub const FLASH_DECAY: f32 = 0.9;

const PALETTE_SIZE: u8 = 15;

/// Visual node state: a colour that moves on every beat and a flash that
/// follows note velocity and fades each frame.
#[derive(Debug, Clone)]
pub struct Visualizer {
    beats: u64,
    color: u8,
    flash: f32,
    last_note: Option<u8>,
}

impl Default for Visualizer {
    fn default() -> Self {
        Self {
            beats: 0,
            color: 1,
            flash: 0.0,
            last_note: None,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn on_quarter_note(&mut self) -> u64 {
        self.beats += 1;
        self.color = (self.color + 1) % PALETTE_SIZE + 1;
        trace!("Beat {} in colour {}", self.beats, self.color);
        self.beats
    }

    fn on_note(&mut self, note: u8, velocity: u8) {
        self.flash = f32::from(velocity.min(127)) / 127.0;
        self.last_note = Some(note);
    }

    pub fn beats(&self) -> u64 {
        self.beats
    }

    /// Palette index in `1..=15`
    pub fn color(&self) -> u8 {
        self.color
    }

    /// Current flash intensity in `0.0..=1.0`
    pub fn flash(&self) -> f32 {
        self.flash
    }

    pub fn last_note(&self) -> Option<u8> {
        self.last_note
    }
}

impl Behavior for Visualizer {
    fn handle(
        &mut self,
        event: &Event,
        outcome: SyncOutcome,
        sync: &SyncState,
        out: &mut Reactions,
    ) {
        match outcome {
            SyncOutcome::Pulse if sync.is_running() && sync.pulse_count() == 0 => {
                let beat = self.on_quarter_note();
                out.cue(Cue::Beat(beat));
            }
            SyncOutcome::PassThrough if event.kind == EventKind::NoteOn && !event.is_note_off() => {
                if let (Some(note), Some(velocity)) = (event.note, event.velocity) {
                    self.on_note(note, velocity);
                    out.cue(Cue::Note { note, velocity });
                }
            }
            _ => {}
        }
    }

    fn frame(&mut self, _sync: &SyncState, _out: &mut Reactions) {
        self.flash *= FLASH_DECAY;
    }
}
