//! Shared event vocabulary
//!
//! Every component exchanges [`Event`]s: the clock master emits the transport
//! kinds (`Clock`, `Start`, `Stop`), sequencers emit `NoteOn`, and consumers react
//! to whatever reaches them. Payload fields are optional because their meaning
//! depends on the kind; an absent field means "not applicable", not zero.

use std::fmt;

/// Pulses per quarter note, fixed by the MIDI clock standard
pub const PULSES_PER_QUARTER: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Clock,
    Start,
    Stop,
    Continue,
    SongPosition,
    NoteOn,
    NoteOff,
    ControlChange,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Clock,
        EventKind::Start,
        EventKind::Stop,
        EventKind::Continue,
        EventKind::SongPosition,
        EventKind::NoteOn,
        EventKind::NoteOff,
        EventKind::ControlChange,
    ];

    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Clock => "clock",
            EventKind::Start => "start",
            EventKind::Stop => "stop",
            EventKind::Continue => "continue",
            EventKind::SongPosition => "song_position",
            EventKind::NoteOn => "note_on",
            EventKind::NoteOff => "note_off",
            EventKind::ControlChange => "control_change",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// True for the kinds that drive the sync state machine
    pub fn is_transport(&self) -> bool {
        matches!(self, EventKind::Clock | EventKind::Start | EventKind::Stop)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message between nodes.
///
/// The emitting node's identifier is deliberately absent: it only exists in the
/// wire envelope and is stripped before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub note: Option<u8>,
    pub velocity: Option<u8>,
    pub channel: Option<u8>,
    pub control: Option<u8>,
    /// Controller value, or the 14-bit position of a song-position event
    pub value: Option<u16>,
}

impl Event {
    /// An event of the given kind with no payload
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            note: None,
            velocity: None,
            channel: None,
            control: None,
            value: None,
        }
    }

    pub fn clock() -> Self {
        Self::new(EventKind::Clock)
    }

    pub fn start() -> Self {
        Self::new(EventKind::Start)
    }

    pub fn stop() -> Self {
        Self::new(EventKind::Stop)
    }

    pub fn resume() -> Self {
        Self::new(EventKind::Continue)
    }

    pub fn song_position(position: u16) -> Self {
        Self {
            value: Some(position),
            ..Self::new(EventKind::SongPosition)
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            note: Some(note),
            velocity: Some(velocity),
            channel: Some(channel),
            ..Self::new(EventKind::NoteOn)
        }
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            note: Some(note),
            velocity: Some(velocity),
            channel: Some(channel),
            ..Self::new(EventKind::NoteOff)
        }
    }

    pub fn control_change(channel: u8, control: u8, value: u16) -> Self {
        Self {
            channel: Some(channel),
            control: Some(control),
            value: Some(value),
            ..Self::new(EventKind::ControlChange)
        }
    }

    /// Checks that the fields this kind relies on are present.
    ///
    /// Extra fields are allowed; receivers simply ignore them.
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            EventKind::NoteOn | EventKind::NoteOff => {
                self.note.is_some() && self.velocity.is_some() && self.channel.is_some()
            }
            EventKind::ControlChange => {
                self.channel.is_some() && self.control.is_some() && self.value.is_some()
            }
            EventKind::SongPosition => self.value.is_some(),
            EventKind::Clock | EventKind::Start | EventKind::Stop | EventKind::Continue => true,
        }
    }

    /// NOTE_OFF, or the running-status style NOTE_ON with velocity 0
    pub fn is_note_off(&self) -> bool {
        match self.kind {
            EventKind::NoteOff => true,
            EventKind::NoteOn => self.velocity == Some(0),
            _ => false,
        }
    }
}
