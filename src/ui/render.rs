use crate::node::Cue;
use crate::sequencer::StepSequencer;
use crate::sync::SyncState;

/// One status line: sync status, enabled flag and pulse phase
pub fn status_text(sync: &SyncState) -> String {
    let mut text = format!("{} | pulse {:>2}/24", sync.status(), sync.pulse_count());
    if !sync.is_enabled() {
        text.push_str(" | DISABLED");
    }
    text
}

/// The sequencer's pattern table, one row per voice, with the playhead marked
/// as `[x]`/`[.]`.
pub fn pattern_rows(sequencer: &StepSequencer) -> Vec<String> {
    let playhead = sequencer.step();
    sequencer
        .voices()
        .iter()
        .enumerate()
        .map(|(index, voice)| {
            let cells: String = voice
                .pattern()
                .steps()
                .iter()
                .enumerate()
                .map(|(step, on)| {
                    let mark = if *on { 'x' } else { '.' };
                    if step == playhead {
                        format!("[{}]", mark)
                    } else {
                        format!(" {} ", mark)
                    }
                })
                .collect();
            let flags = if voice.is_muted() { " muted" } else { "" };
            format!(
                "{} {:<6} p{}/{} {}{}",
                index + 1,
                voice.name(),
                voice.variant_index() + 1,
                voice.variant_count(),
                cells,
                flags
            )
        })
        .collect()
}

pub fn describe_cue(cue: &Cue) -> String {
    match cue {
        Cue::Step(trigger) => format!("step {:>2}: note {}", trigger.step + 1, trigger.note),
        Cue::Note { note, velocity } => format!("note {} at velocity {}", note, velocity),
        Cue::Beat(beat) => format!("beat {}", beat),
    }
}
