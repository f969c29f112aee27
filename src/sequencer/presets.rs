//! Reference pattern sets for the stock node variants

use super::{Pattern, StepClock, StepSequencer, Voice};

pub const KICK: u8 = 36;
pub const SNARE: u8 = 38;
pub const CLAP: u8 = 39;
pub const HIHAT: u8 = 42;
pub const DRUM_CHANNEL: u8 = 10;

/// Frames per step for the offline sequencer
pub const OFFLINE_FRAMES_PER_STEP: u32 = 8;

fn grid(notation: &str) -> Pattern {
    // Presets are literals checked by the tests below
    notation.parse().unwrap_or_else(|_| Pattern::empty(16))
}

/// Four-step kick, `x.x.`, stepping on sixteenths and telling the synth about
/// every hit.
pub fn simple_kick() -> StepSequencer {
    StepSequencer::new(4, StepClock::SIXTEENTHS).with_voice(
        Voice::new("Kick", KICK, Pattern::from_bits(&[1, 0, 1, 0]))
            .with_channel(DRUM_CHANNEL)
            .notifying_peers(),
    )
}

/// Sixteen-step kit of kick, snare, hi-hat and clap with three variants each
pub fn drum_kit() -> StepSequencer {
    StepSequencer::new(16, StepClock::SIXTEENTHS)
        .with_voice(
            Voice::new("Kick", KICK, grid("x...x...x...x..."))
                .with_variant(grid("x...x...x..xx..."))
                .with_variant(grid("xx..x...xx..x...")),
        )
        .with_voice(
            Voice::new("Snare", SNARE, grid("..x...x...x...x."))
                .with_variant(grid("..x...x...xx..x."))
                .with_variant(grid("..xx..x...xx..x.")),
        )
        .with_voice(
            Voice::new("HiHat", HIHAT, grid("xxxxxxxxxxxxxxxx"))
                .with_variant(grid("x.x.x.x.x.x.x.x."))
                .with_variant(grid("xx.xxx.xxx.xxx.x")),
        )
        .with_voice(
            Voice::new("Clap", CLAP, grid("..x...x...x...x."))
                .with_variant(grid("...x...x...x...x"))
                .with_variant(grid("..xx..x...xx..xx")),
        )
}

/// Four-step kick driven by rendered frames instead of the network clock
pub fn offline_kick() -> StepSequencer {
    StepSequencer::new(
        4,
        StepClock::Frames {
            frames_per_step: OFFLINE_FRAMES_PER_STEP,
        },
    )
    .with_voice(Voice::new("Kick", KICK, Pattern::from_bits(&[1, 0, 1, 0])))
}
