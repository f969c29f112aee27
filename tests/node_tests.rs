use patchsync::clock::ManualTime;
use patchsync::sequencer::presets::{simple_kick, KICK};
use patchsync::{
    BpmRange, ClockGenerator, Cue, Event, EventKind, EventSink, LoopbackBus, Monitor, Node,
    NodeOptions, NoteConsumer, StepSequencer, SyncStatus, Transport, Visualizer,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn join<B: patchsync::Behavior>(bus: &LoopbackBus, name: &str, behavior: B) -> Node<B> {
    join_with(bus, name, behavior, NodeOptions::default())
}

fn join_with<B: patchsync::Behavior>(
    bus: &LoopbackBus,
    name: &str,
    behavior: B,
    options: NodeOptions,
) -> Node<B> {
    let transport: Arc<dyn Transport> = Arc::new(bus.attach(format!("{}-test", name)));
    Node::start(name, behavior, transport, options).unwrap()
}

fn kick_cue() -> Cue {
    Cue::Note {
        note: KICK,
        velocity: 127,
    }
}

struct Patch {
    clock: Node<Monitor>,
    rhythm: Node<StepSequencer>,
    synth: Node<NoteConsumer>,
    generator: ClockGenerator,
    t0: Instant,
}

fn patch() -> Patch {
    let bus = LoopbackBus::new();
    Patch {
        clock: join(&bus, "clock", Monitor::new()),
        rhythm: join(&bus, "rhythm", simple_kick()),
        synth: join(&bus, "synth", NoteConsumer::new()),
        generator: ClockGenerator::new(120.0, BpmRange::default()),
        t0: Instant::now(),
    }
}

impl Patch {
    /// Emits every pulse due up to and including pulse number `n` after START
    fn run_to(&mut self, n: u32) {
        let at = self.t0 + self.generator.interval() * n;
        self.generator.tick(at, &self.clock);
    }

    fn notes_heard(&self) -> u64 {
        self.synth.with_behavior(|s| s.notes_started())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_drives_rhythm_into_synth() {
        let mut p = patch();
        assert_eq!(p.rhythm.status(), SyncStatus::WaitingForSync);

        p.generator.start(p.t0, &p.clock);
        // The downbeat is forwarded as soon as START lands
        assert_eq!(p.notes_heard(), 1);
        assert_eq!(p.synth.with_behavior(|s| s.current_note()), Some(KICK));

        // Pulses 0..=11: boundaries at 6 (rest) and 12 (hit)
        p.run_to(11);
        assert_eq!(p.rhythm.status(), SyncStatus::Running);
        assert_eq!(p.rhythm.sync_state().pulse_count(), 12);
        assert_eq!(p.rhythm.with_behavior(|s| s.step()), 2);
        assert_eq!(p.notes_heard(), 2);

        let cues = p.rhythm.drain_cues();
        assert_eq!(cues.len(), 2);
        assert!(cues.iter().all(|c| matches!(c, Cue::Step(t) if t.note == KICK)));
        assert_eq!(p.synth.drain_cues(), vec![kick_cue(), kick_cue()]);

        // The clock hears the forwarded notes but not its own pulses
        p.clock.with_behavior(|m| {
            assert_eq!(m.count(EventKind::NoteOn), 2);
            assert_eq!(m.count(EventKind::Clock), 0);
        });
    }

    #[test]
    fn test_disabled_node_freezes_and_resumes() {
        let mut p = patch();
        p.generator.start(p.t0, &p.clock);
        p.run_to(11);

        p.rhythm.set_enabled(false);
        p.run_to(23);
        assert_eq!(p.rhythm.sync_state().pulse_count(), 12);
        assert_eq!(p.rhythm.with_behavior(|s| s.step()), 2);
        assert_eq!(p.notes_heard(), 2);
        // Frames are skipped too
        p.rhythm.frame();

        assert!(p.rhythm.toggle_enabled());
        assert!(p.rhythm.is_enabled());
        // Pulses 24..=35 count on from 12: boundaries at 18 (rest) and 0 (hit)
        p.run_to(35);
        assert_eq!(p.rhythm.sync_state().pulse_count(), 0);
        assert_eq!(p.rhythm.with_behavior(|s| s.step()), 0);
        assert_eq!(p.notes_heard(), 3);
    }

    #[test]
    fn test_stop_halts_sequencer() {
        let mut p = patch();
        p.generator.start(p.t0, &p.clock);
        p.run_to(5);
        p.generator.stop(&p.clock);
        assert_eq!(p.rhythm.status(), SyncStatus::Stopped);

        // Stray pulses after STOP move the phase but not the pattern
        for _ in 0..12 {
            p.clock.send_event(&Event::clock());
        }
        assert_eq!(p.rhythm.with_behavior(|s| s.step()), 1);
        assert_eq!(p.notes_heard(), 1);
    }

    #[test]
    fn test_velocity_zero_releases_note() {
        let bus = LoopbackBus::new();
        let synth = join(&bus, "synth", NoteConsumer::new());
        let keys = bus.attach("keys");

        keys.send(&Event::note_on(1, 60, 100));
        assert_eq!(synth.with_behavior(|s| s.current_note()), Some(60));

        keys.send(&Event::note_on(1, 60, 0));
        assert_eq!(synth.with_behavior(|s| s.current_note()), None);
        let cues = synth.drain_cues();
        assert_eq!(
            cues,
            vec![Cue::Note {
                note: 60,
                velocity: 100
            }]
        );
    }

    #[test]
    fn test_channel_filter() {
        let bus = LoopbackBus::new();
        let synth = join(&bus, "synth", NoteConsumer::new().with_channels([2]));
        let keys = bus.attach("keys");

        keys.send(&Event::note_on(1, 60, 100));
        assert_eq!(synth.with_behavior(|s| s.current_note()), None);
        keys.send(&Event::note_on(2, 62, 100));
        assert_eq!(synth.with_behavior(|s| s.current_note()), Some(62));
    }

    #[test]
    fn test_local_notes_use_the_same_pipeline() {
        let bus = LoopbackBus::new();
        let synth = join(&bus, "synth", NoteConsumer::new());
        let monitor = join(&bus, "monitor", Monitor::new());

        synth.deliver_local(Event::note_on(1, 67, 90));
        assert_eq!(synth.with_behavior(|s| s.current_note()), Some(67));
        // Local notes stay local
        assert_eq!(monitor.with_behavior(|m| m.total()), 0);
    }

    #[test]
    fn test_watchdog_stops_silent_node() {
        let bus = LoopbackBus::new();
        let time = Arc::new(ManualTime::new(Instant::now()));
        let options = NodeOptions {
            stop_timeout: Some(Duration::from_millis(500)),
            time: time.clone(),
        };
        let rhythm = join_with(&bus, "rhythm", simple_kick(), options);
        let master = bus.attach("master");

        master.send(&Event::start());
        master.send(&Event::clock());
        time.advance(Duration::from_millis(400));
        rhythm.frame();
        assert_eq!(rhythm.status(), SyncStatus::Running);

        time.advance(Duration::from_millis(200));
        rhythm.frame();
        assert_eq!(rhythm.status(), SyncStatus::Stopped);
        assert_eq!(rhythm.sync_state().pulse_count(), 0);
    }

    #[test]
    fn test_no_watchdog_by_default() {
        let bus = LoopbackBus::new();
        let rhythm = join(&bus, "rhythm", simple_kick());
        let master = bus.attach("master");

        master.send(&Event::start());
        master.send(&Event::clock());
        std::thread::sleep(Duration::from_millis(20));
        rhythm.frame();
        assert_eq!(rhythm.status(), SyncStatus::Running);
    }

    #[test]
    fn test_monitor_counts_everything_delivered() {
        let bus = LoopbackBus::new();
        let monitor = join(&bus, "monitor", Monitor::new());
        let master = bus.attach("master");

        master.send(&Event::start());
        master.send(&Event::clock());
        master.send(&Event::control_change(1, 7, 100));
        monitor.with_behavior(|m| {
            assert_eq!(m.total(), 3);
            assert_eq!(m.last(), Some(&Event::control_change(1, 7, 100)));
        });
        assert_eq!(monitor.transport_stats().delivered, 3);
    }

    #[test]
    fn test_visual_node_beats_on_quarter_notes() {
        let bus = LoopbackBus::new();
        let visual = join(&bus, "visual", Visualizer::new());
        let master = bus.attach("master");

        // Stopped pulses never count as beats
        for _ in 0..24 {
            master.send(&Event::clock());
        }
        assert!(visual.drain_cues().is_empty());

        master.send(&Event::start());
        for _ in 0..24 {
            master.send(&Event::clock());
        }
        assert_eq!(visual.drain_cues(), vec![Cue::Beat(1)]);

        master.send(&Event::note_on(10, 36, 127));
        assert_eq!(visual.drain_cues(), vec![kick_cue()]);
        assert_eq!(visual.with_behavior(|v| v.flash()), 1.0);
    }
}
