use patchsync::{Event, SyncOutcome, SyncState, SyncStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiting_until_first_pulse() {
        let mut sync = SyncState::new();
        assert_eq!(sync.status(), SyncStatus::WaitingForSync);

        // START alone does not count as hearing the master
        sync.apply(&Event::start());
        assert_eq!(sync.status(), SyncStatus::WaitingForSync);
        assert!(sync.is_running());

        sync.apply(&Event::clock());
        assert_eq!(sync.status(), SyncStatus::Running);
    }

    #[test]
    fn test_pulse_count_wraps_at_24() {
        let mut sync = SyncState::new();
        sync.apply(&Event::start());
        for expected in 1..=23 {
            sync.apply(&Event::clock());
            assert_eq!(sync.pulse_count(), expected);
        }
        sync.apply(&Event::clock());
        assert_eq!(sync.pulse_count(), 0);

        for _ in 0..100 {
            sync.apply(&Event::clock());
        }
        assert_eq!(sync.pulse_count(), 100 % 24);
    }

    #[test]
    fn test_pulses_count_while_stopped() {
        let mut sync = SyncState::new();
        for _ in 0..5 {
            assert_eq!(sync.apply(&Event::clock()), SyncOutcome::Pulse);
        }
        assert_eq!(sync.pulse_count(), 5);
        assert_eq!(sync.status(), SyncStatus::Stopped);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut sync = SyncState::new();
        sync.apply(&Event::clock());
        sync.apply(&Event::start());
        sync.apply(&Event::clock());
        sync.apply(&Event::clock());

        assert_eq!(sync.apply(&Event::start()), SyncOutcome::Started);
        assert_eq!(sync.pulse_count(), 0);
        assert!(sync.is_running());

        sync.apply(&Event::stop());
        let after_one = sync;
        sync.apply(&Event::stop());
        assert_eq!(sync, after_one);
        assert_eq!(sync.status(), SyncStatus::Stopped);
    }

    #[test]
    fn test_synced_never_reverts() {
        let mut sync = SyncState::new();
        sync.apply(&Event::clock());
        sync.apply(&Event::stop());
        sync.apply(&Event::start());
        sync.apply(&Event::stop());
        assert!(sync.is_synced());
    }

    #[test]
    fn test_disabled_node_ignores_transport() {
        let mut sync = SyncState::new();
        sync.apply(&Event::start());
        sync.apply(&Event::clock());
        sync.set_enabled(false);

        let frozen = sync;
        assert_eq!(sync.apply(&Event::clock()), SyncOutcome::Dropped);
        assert_eq!(sync.apply(&Event::stop()), SyncOutcome::Dropped);
        assert_eq!(sync.apply(&Event::note_on(1, 60, 100)), SyncOutcome::Dropped);
        assert_eq!(sync, frozen);

        sync.set_enabled(true);
        sync.apply(&Event::clock());
        assert_eq!(sync.pulse_count(), 2);
    }

    #[test]
    fn test_other_events_pass_through() {
        let mut sync = SyncState::new();
        assert_eq!(
            sync.apply(&Event::note_on(10, 36, 127)),
            SyncOutcome::PassThrough
        );
        assert_eq!(sync.apply(&Event::resume()), SyncOutcome::PassThrough);
        assert_eq!(sync, SyncState::new());
    }
}
