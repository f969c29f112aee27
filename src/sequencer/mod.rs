//! Step sequencing
//!
//! A [`StepSequencer`] owns a table of [`Voice`]s sharing one step index. What
//! moves the index forward is the [`StepClock`]: a fixed number of CLOCK pulses
//! for networked nodes, or a fixed number of rendered frames for the offline
//! variant. Either way the same pattern table is evaluated.

mod pattern;
pub mod presets;

pub use pattern::{ParsePatternError, Pattern};

use crate::event::{Event, PULSES_PER_QUARTER};
use log::{debug, trace};
use std::fmt;

/// Index of a voice in its sequencer's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub usize);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice {}", self.0)
    }
}

/// What counts as one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepClock {
    /// Advance every N clock pulses; 6 gives sixteenth notes at 24 PPQ
    Pulses { pulses_per_step: u8 },
    /// Advance every N rendered frames, with no network clock at all
    Frames { frames_per_step: u32 },
}

impl StepClock {
    pub const SIXTEENTHS: StepClock = StepClock::Pulses {
        pulses_per_step: PULSES_PER_QUARTER / 4,
    };
}

/// Input that may move the step index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepInput {
    Pulse { pulse_count: u8, running: bool },
    Frame,
}

/// One track of the pattern table
#[derive(Debug, Clone)]
pub struct Voice {
    name: String,
    note: u8,
    velocity: u8,
    channel: u8,
    variants: Vec<Pattern>,
    current: usize,
    muted: bool,
    notify_peers: bool,
}

impl Voice {
    pub fn new(name: impl Into<String>, note: u8, pattern: Pattern) -> Self {
        Self {
            name: name.into(),
            note,
            velocity: 127,
            channel: 10,
            variants: vec![pattern],
            current: 0,
            muted: false,
            notify_peers: false,
        }
    }

    pub fn with_variant(mut self, pattern: Pattern) -> Self {
        self.variants.push(pattern);
        self
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Also send a NOTE_ON to the other nodes whenever this voice fires
    pub fn notifying_peers(mut self) -> Self {
        self.notify_peers = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn pattern(&self) -> &Pattern {
        &self.variants[self.current]
    }

    pub fn variants(&self) -> &[Pattern] {
        &self.variants
    }

    pub fn variant_index(&self) -> usize {
        self.current
    }

    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn notifies_peers(&self) -> bool {
        self.notify_peers
    }
}

/// A voice firing on a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub voice: VoiceId,
    pub step: usize,
    pub note: u8,
    pub velocity: u8,
    pub channel: u8,
    pub notify_peers: bool,
}

impl Trigger {
    pub fn to_event(&self) -> Event {
        Event::note_on(self.channel, self.note, self.velocity)
    }
}

#[derive(Debug, Clone)]
pub struct StepSequencer {
    voices: Vec<Voice>,
    length: usize,
    step: usize,
    clock: StepClock,
    frames: u64,
}

impl StepSequencer {
    pub fn new(length: usize, clock: StepClock) -> Self {
        let clock = match clock {
            StepClock::Pulses { pulses_per_step } => StepClock::Pulses {
                pulses_per_step: pulses_per_step.max(1),
            },
            StepClock::Frames { frames_per_step } => StepClock::Frames {
                frames_per_step: frames_per_step.max(1),
            },
        };
        Self {
            voices: Vec::new(),
            length: length.max(1),
            step: 0,
            clock,
            frames: 0,
        }
    }

    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voices.push(voice);
        self
    }

    /// Rewinds to step 0 and fires it straight away, so the downbeat is heard
    /// without waiting for the first step boundary.
    pub fn start(&mut self) -> Vec<Trigger> {
        self.step = 0;
        self.frames = 0;
        self.evaluate()
    }

    /// Rewinds without firing
    pub fn reset(&mut self) {
        self.step = 0;
        self.frames = 0;
    }

    /// Moves to the next step if `input` lands on a step boundary and returns
    /// whatever fires there.
    pub fn advance(&mut self, input: StepInput) -> Vec<Trigger> {
        if !self.at_boundary(input) {
            return Vec::new();
        }
        self.step = (self.step + 1) % self.length;
        trace!("Advanced to step {}", self.step);
        self.evaluate()
    }

    fn at_boundary(&mut self, input: StepInput) -> bool {
        match (self.clock, input) {
            (
                StepClock::Pulses { pulses_per_step },
                StepInput::Pulse {
                    pulse_count,
                    running,
                },
            ) => running && pulse_count % pulses_per_step == 0,
            (StepClock::Frames { frames_per_step }, StepInput::Frame) => {
                self.frames += 1;
                self.frames % u64::from(frames_per_step) == 0
            }
            _ => false,
        }
    }

    fn evaluate(&self) -> Vec<Trigger> {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, voice)| !voice.muted && voice.pattern().is_active(self.step))
            .map(|(index, voice)| Trigger {
                voice: VoiceId(index),
                step: self.step,
                note: voice.note,
                velocity: voice.velocity,
                channel: voice.channel,
                notify_peers: voice.notify_peers,
            })
            .collect()
    }

    /// Returns the new mute state, or `None` for an unknown voice
    pub fn toggle_mute(&mut self, id: VoiceId) -> Option<bool> {
        let voice = self.voice_mut(id)?;
        voice.muted = !voice.muted;
        debug!("{} muted: {}", voice.name, voice.muted);
        Some(voice.muted)
    }

    /// Switches to the voice's next pattern variant, wrapping around
    pub fn cycle_pattern(&mut self, id: VoiceId) -> Option<usize> {
        let voice = self.voice_mut(id)?;
        voice.current = (voice.current + 1) % voice.variants.len();
        debug!("{} now on pattern {}", voice.name, voice.current + 1);
        Some(voice.current)
    }

    /// Selects a variant by index; out-of-range indices leave it unchanged
    pub fn select_pattern(&mut self, id: VoiceId, variant: usize) -> bool {
        match self.voice_mut(id) {
            Some(voice) if variant < voice.variants.len() => {
                voice.current = variant;
                true
            }
            _ => {
                debug!("Ignoring pattern {} for {}", variant, id);
                false
            }
        }
    }

    /// Flips one step of the voice's current pattern
    pub fn toggle_step(&mut self, id: VoiceId, step: usize) -> bool {
        let Some(voice) = self.voice_mut(id) else {
            return false;
        };
        let current = voice.current;
        let toggled = voice.variants[current].toggle(step);
        if !toggled {
            debug!("Ignoring step {} outside pattern", step);
        }
        toggled
    }

    fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        let found = self.voices.get_mut(id.0);
        if found.is_none() {
            debug!("No such voice: {}", id);
        }
        found
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id.0)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn clock(&self) -> StepClock {
        self.clock
    }
}
