use crate::event::PULSES_PER_QUARTER;
use indicatif::{ProgressBar, ProgressStyle};

const PULSE_TEMPLATE: &str = "{prefix:.bold} [{bar:40.cyan}] {pos}/{len}";
const STEP_TEMPLATE: &str = "{prefix:.bold} [{bar:32.white/black}] {pos}/{len}";
const STATUS_TEMPLATE: &str = "{prefix:.bold.dim} {spinner} {wide_msg}";

pub fn create_pulse_progress() -> ProgressBar {
    let pb = ProgressBar::new(u64::from(PULSES_PER_QUARTER));
    if let Ok(style) = ProgressStyle::default_bar().template(PULSE_TEMPLATE) {
        pb.set_style(style.progress_chars("⣀⣤⣦⣶⣷⣿ "));
    }
    pb.set_prefix("PPQ ");
    pb
}

pub fn create_step_progress(steps: usize) -> ProgressBar {
    let pb = ProgressBar::new(steps as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(STEP_TEMPLATE) {
        pb.set_style(style.progress_chars("█▊ "));
    }
    pb.set_prefix("Step");
    pb
}

pub fn create_status_spinner(node_name: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(STATUS_TEMPLATE) {
        pb.set_style(style);
    }
    pb.set_prefix(node_name.to_string());
    pb
}
