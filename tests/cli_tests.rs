#[cfg(test)]
mod tests {
    use clap::Parser;
    use patchsync::cli::{parse_command, source_id, Args, Command, Role};
    use patchsync::{Settings, Topology, VoiceId};

    #[test]
    fn test_clock_with_tempo() {
        let args = Args::parse_from(["patchsync", "clock", "--bpm", "98", "--autostart"]);
        assert_eq!(
            args.role,
            Role::Clock {
                bpm: Some(98.0),
                autostart: true
            }
        );
        assert_eq!(args.node_name(), "clock");
    }

    #[test]
    fn test_synth_channels_are_comma_separated() {
        let args = Args::parse_from(["patchsync", "synth", "--channels", "1,10"]);
        assert_eq!(
            args.role,
            Role::Synth {
                channels: vec![1, 10]
            }
        );
    }

    #[test]
    fn test_name_overrides_role_default() {
        let args = Args::parse_from(["patchsync", "--name", "kick2", "rhythm"]);
        assert_eq!(args.node_name(), "kick2");
        assert!(source_id("kick2").starts_with("kick2-"));
    }

    #[test]
    fn test_flags_override_settings() {
        let args = Args::parse_from([
            "patchsync",
            "--topology",
            "unicast",
            "--port",
            "6100",
            "clock",
            "--bpm",
            "300",
        ]);
        let mut settings = Settings::default();
        args.apply_overrides(&mut settings);
        assert_eq!(settings.topology, Topology::Unicast);
        assert_eq!(settings.port, 6100);
        // Clamped later by the generator, not here
        assert_eq!(settings.bpm, 300.0);
    }

    #[test]
    fn test_role_is_required() {
        assert!(Args::try_parse_from(["patchsync"]).is_err());
        assert!(Args::try_parse_from(["patchsync", "theremin"]).is_err());
    }

    #[test]
    fn test_console_commands() {
        assert_eq!(parse_command("space"), Some(Command::Toggle));
        assert_eq!(parse_command("bpm 133.5"), Some(Command::SetBpm(133.5)));
        assert_eq!(parse_command("mute 1"), Some(Command::Mute(VoiceId(0))));
        assert_eq!(
            parse_command("step 2 16"),
            Some(Command::ToggleStep(VoiceId(1), 15))
        );
        assert_eq!(parse_command("Q"), Some(Command::Quit));
        assert_eq!(parse_command("mute 0"), None);
        assert_eq!(parse_command("bpm fast"), None);
    }
}
