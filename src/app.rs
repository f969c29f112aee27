//! Per-role frame handlers driven by [`FrameLoop`](crate::frame_loop::FrameLoop)
//!
//! Each running process owns exactly one of these:
//! - [`ClockApp`] for the master clock
//! - [`NodeApp`] for any networked follower
//! - [`OfflineApp`] for the frame-driven sequencer with no transport

use crate::cli::Command;
use crate::clock::{ClockGenerator, MonotonicClock, TimeSource};
use crate::consumer::NoteConsumer;
use crate::event::Event;
use crate::frame_loop::{FrameHandler, LoopControl};
use crate::node::{Behavior, Monitor, Node, Visualizer};
use crate::sequencer::{StepInput, StepSequencer, Trigger};
use crate::ui::{describe_cue, pattern_rows, status_text, StatusLine};
use log::debug;

/// Role-specific console commands and display
pub trait Console: Behavior + Sized {
    fn steps(&self) -> Option<usize> {
        None
    }

    fn current_step(&self) -> Option<usize> {
        None
    }

    /// Returns false when the command means nothing for this role
    fn command(_node: &Node<Self>, _command: &Command, _status: &StatusLine) -> bool {
        false
    }

    fn describe(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Console for StepSequencer {
    fn steps(&self) -> Option<usize> {
        Some(self.length())
    }

    fn current_step(&self) -> Option<usize> {
        Some(self.step())
    }

    fn command(node: &Node<Self>, command: &Command, status: &StatusLine) -> bool {
        let changed = match *command {
            Command::Mute(voice) => node.with_behavior(|s| s.toggle_mute(voice)).is_some(),
            Command::NextPattern(voice) => {
                node.with_behavior(|s| s.cycle_pattern(voice)).is_some()
            }
            Command::ToggleStep(voice, step) => node.with_behavior(|s| s.toggle_step(voice, step)),
            _ => return false,
        };
        if changed {
            for row in node.with_behavior(|s| pattern_rows(s)) {
                status.println(row);
            }
        }
        true
    }

    fn describe(&self) -> Vec<String> {
        pattern_rows(self)
    }
}

impl Console for NoteConsumer {
    fn command(node: &Node<Self>, command: &Command, _status: &StatusLine) -> bool {
        match *command {
            Command::NoteOn(note) => node.deliver_local(Event::note_on(1, note, 100)),
            Command::NoteOff => node.deliver_local(Event::note_off(1, 0, 0)),
            _ => return false,
        }
        true
    }

    fn describe(&self) -> Vec<String> {
        vec![format!(
            "current note: {:?}, notes played: {}",
            self.current_note(),
            self.notes_started()
        )]
    }
}

impl Console for Monitor {
    fn describe(&self) -> Vec<String> {
        vec![format!(
            "events seen: {}, last: {:?}",
            self.total(),
            self.last()
        )]
    }
}

impl Console for Visualizer {
    fn describe(&self) -> Vec<String> {
        vec![format!(
            "beats: {}, colour: {}, flash: {:.2}, last note: {:?}",
            self.beats(),
            self.color(),
            self.flash(),
            self.last_note()
        )]
    }
}

/// A networked follower node
pub struct NodeApp<B: Console> {
    node: Node<B>,
    status: StatusLine,
}

impl<B: Console> NodeApp<B> {
    pub fn new(node: Node<B>) -> Self {
        let steps = node.with_behavior(|b| b.steps());
        let status = StatusLine::new(node.name(), steps);
        NodeApp { node, status }
    }

    pub fn node(&self) -> &Node<B> {
        &self.node
    }

    pub fn finish(&self) {
        self.status.finish();
        self.node.shutdown();
    }
}

impl<B: Console> FrameHandler<Command> for NodeApp<B> {
    fn command(&mut self, command: Command) -> LoopControl {
        match command {
            Command::Quit => return LoopControl::Exit,
            Command::Toggle => {
                let enabled = self.node.toggle_enabled();
                self.status
                    .println(if enabled { "enabled" } else { "disabled" });
            }
            Command::Enable(enabled) => self.node.set_enabled(enabled),
            Command::Status => {
                let stats = self.node.transport_stats();
                self.status.println(format!("{:?}", stats));
                for line in self.node.with_behavior(|b| b.describe()) {
                    self.status.println(line);
                }
            }
            other => {
                if !B::command(&self.node, &other, &self.status) {
                    self.status
                        .println(format!("'{:?}' does nothing on this node", other));
                }
            }
        }
        LoopControl::Continue
    }

    fn frame(&mut self) -> LoopControl {
        self.node.frame();
        for cue in self.node.drain_cues() {
            debug!("{}: {}", self.node.name(), describe_cue(&cue));
        }
        let sync = self.node.sync_state();
        let step = self.node.with_behavior(|b| b.current_step());
        self.status
            .update(sync.pulse_count(), step, status_text(&sync));
        LoopControl::Continue
    }
}

/// The master clock. Its node only listens; pulses go out through it.
pub struct ClockApp {
    generator: ClockGenerator,
    node: Node<Monitor>,
    time: MonotonicClock,
    status: StatusLine,
}

impl ClockApp {
    pub fn new(node: Node<Monitor>, generator: ClockGenerator) -> Self {
        ClockApp {
            generator,
            status: StatusLine::new(node.name(), None),
            node,
            time: MonotonicClock,
        }
    }

    pub fn toggle(&mut self) {
        let now = self.time.now();
        self.generator.toggle(now, &self.node);
    }

    pub fn generator(&self) -> &ClockGenerator {
        &self.generator
    }

    /// Sends a final STOP if still running
    pub fn finish(&mut self) {
        if self.generator.is_running() {
            self.generator.stop(&self.node);
        }
        self.status.finish();
        self.node.shutdown();
    }
}

impl FrameHandler<Command> for ClockApp {
    fn command(&mut self, command: Command) -> LoopControl {
        let now = self.time.now();
        match command {
            Command::Quit => return LoopControl::Exit,
            Command::Toggle => self.generator.toggle(now, &self.node),
            Command::Start => self.generator.start(now, &self.node),
            Command::Stop => self.generator.stop(&self.node),
            Command::SetBpm(bpm) => self.generator.set_bpm(bpm),
            Command::NudgeBpm(delta) => self.generator.nudge_bpm(delta),
            Command::Status => self.status.println(format!(
                "{:?} at {:.1} BPM, {} pulses sent, {:?}",
                self.generator.state(),
                self.generator.bpm(),
                self.generator.pulses_emitted(),
                self.node.transport_stats()
            )),
            other => self
                .status
                .println(format!("'{:?}' does nothing on the clock", other)),
        }
        LoopControl::Continue
    }

    fn frame(&mut self) -> LoopControl {
        self.generator.poll(&self.time, &self.node);
        self.status.update(
            self.generator.pulse_count(),
            None,
            format!("{:?} | {:.1} BPM", self.generator.state(), self.generator.bpm()),
        );
        LoopControl::Continue
    }
}

/// Frame-driven sequencer with no transport
pub struct OfflineApp {
    sequencer: StepSequencer,
    running: bool,
    triggers_fired: u64,
    status: StatusLine,
}

impl OfflineApp {
    /// Starts straight away, firing step 0
    pub fn new(node_name: &str, sequencer: StepSequencer) -> Self {
        let status = StatusLine::new(node_name, Some(sequencer.length()));
        let mut app = OfflineApp {
            sequencer,
            running: true,
            triggers_fired: 0,
            status,
        };
        let triggers = app.sequencer.start();
        app.record(triggers);
        app
    }

    fn record(&mut self, triggers: Vec<Trigger>) {
        for trigger in triggers {
            debug!("offline step {}: note {}", trigger.step + 1, trigger.note);
            self.triggers_fired += 1;
        }
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn triggers_fired(&self) -> u64 {
        self.triggers_fired
    }

    pub fn finish(&self) {
        self.status.finish();
    }
}

impl FrameHandler<Command> for OfflineApp {
    fn command(&mut self, command: Command) -> LoopControl {
        match command {
            Command::Quit => return LoopControl::Exit,
            Command::Toggle => self.running = !self.running,
            Command::Start => {
                self.running = true;
                let triggers = self.sequencer.start();
                self.record(triggers);
            }
            Command::Stop => {
                self.running = false;
                self.sequencer.reset();
            }
            Command::Enable(enabled) => self.running = enabled,
            Command::Status => {
                for row in pattern_rows(&self.sequencer) {
                    self.status.println(row);
                }
            }
            Command::Mute(voice) => {
                self.sequencer.toggle_mute(voice);
            }
            Command::ToggleStep(voice, step) => {
                self.sequencer.toggle_step(voice, step);
            }
            other => self
                .status
                .println(format!("'{:?}' does nothing offline", other)),
        }
        LoopControl::Continue
    }

    fn frame(&mut self) -> LoopControl {
        if self.running {
            let triggers = self.sequencer.advance(StepInput::Frame);
            self.record(triggers);
        }
        let state = if self.running { "RUNNING" } else { "STOPPED" };
        self.status.update(
            0,
            Some(self.sequencer.step()),
            format!("OFFLINE {}", state),
        );
        LoopControl::Continue
    }
}
