//! Terminal presentation for a running node
//!
//! The core never calls into this module. The frame loop reads node state
//! each frame and pushes it here:
//! - a pulse-phase bar (0..24)
//! - a step bar sized to the sequencer
//! - a spinner line carrying the status text
//!
//! Drawing goes to stderr through indicatif so log output and the console
//! prompt stay separate.

mod progress;
mod render;

pub use progress::{create_pulse_progress, create_status_spinner, create_step_progress};
pub use render::{describe_cue, pattern_rows, status_text};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

pub struct StatusLine {
    #[allow(dead_code)]
    multi_progress: MultiProgress,
    pulse_pb: ProgressBar,
    step_pb: Option<ProgressBar>,
    status_pb: ProgressBar,
}

impl StatusLine {
    /// `steps` adds a step bar for sequencer nodes
    pub fn new(node_name: &str, steps: Option<usize>) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
        let pulse_pb = multi_progress.add(create_pulse_progress());
        let step_pb = steps.map(|len| multi_progress.add(create_step_progress(len)));
        let status_pb = multi_progress.add(create_status_spinner(node_name));

        StatusLine {
            multi_progress,
            pulse_pb,
            step_pb,
            status_pb,
        }
    }

    pub fn update(&self, pulse_count: u8, step: Option<usize>, message: String) {
        self.pulse_pb.set_position(u64::from(pulse_count));
        if let (Some(pb), Some(step)) = (&self.step_pb, step) {
            pb.set_position(step as u64 + 1);
        }
        self.status_pb.set_message(message);
        self.status_pb.tick();
    }

    /// Prints a line above the bars without tearing them
    pub fn println(&self, line: impl AsRef<str>) {
        self.status_pb.println(line);
    }

    pub fn finish(&self) {
        self.pulse_pb.finish_and_clear();
        if let Some(pb) = &self.step_pb {
            pb.finish_and_clear();
        }
        self.status_pb.finish_with_message("stopped");
    }
}
