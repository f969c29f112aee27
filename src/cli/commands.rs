use crate::sequencer::VoiceId;

/// One line typed at a running node's console
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Clock: start or stop; other nodes: enable or disable
    Toggle,
    Start,
    Stop,
    SetBpm(f64),
    NudgeBpm(f64),
    Enable(bool),
    Mute(VoiceId),
    NextPattern(VoiceId),
    ToggleStep(VoiceId, usize),
    NoteOn(u8),
    NoteOff,
    Status,
    Quit,
}

/// Parses a console line. Voices and steps are typed 1-based, as shown on
/// screen. Returns `None` for anything unrecognised.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let voice = |i: usize| -> Option<VoiceId> {
        let n: usize = args.get(i)?.parse().ok()?;
        n.checked_sub(1).map(VoiceId)
    };

    let command = match (head.as_str(), args.len()) {
        ("space" | "t" | "toggle", 0) => Command::Toggle,
        ("start", 0) => Command::Start,
        ("stop", 0) => Command::Stop,
        ("bpm", 1) => Command::SetBpm(args[0].parse().ok()?),
        ("+" | "-", 0) => Command::NudgeBpm(if head == "+" { 1.0 } else { -1.0 }),
        ("nudge", 1) => Command::NudgeBpm(args[0].parse().ok()?),
        ("on" | "enable", 0) => Command::Enable(true),
        ("off" | "disable", 0) => Command::Enable(false),
        ("mute" | "m", 1) => Command::Mute(voice(0)?),
        ("pattern" | "p", 1) => Command::NextPattern(voice(0)?),
        ("step", 2) => {
            let step: usize = args[1].parse().ok()?;
            Command::ToggleStep(voice(0)?, step.checked_sub(1)?)
        }
        ("note" | "z", 0) => Command::NoteOn(60),
        ("note" | "z", 1) => Command::NoteOn(args[0].parse().ok()?),
        ("release" | "r", 0) => Command::NoteOff,
        ("status" | "s", 0) => Command::Status,
        ("quit" | "q" | "exit", 0) => Command::Quit,
        _ => return None,
    };
    Some(command)
}
