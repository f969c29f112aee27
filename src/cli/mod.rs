mod commands;

pub use commands::{parse_command, Command};

use crate::config::{Settings, Topology};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file (defaults to ./patchsync.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logical node name; also selects the port in the unicast topology
    #[arg(long)]
    pub name: Option<String>,

    /// broadcast or unicast
    #[arg(long)]
    pub topology: Option<Topology>,

    /// Shared broadcast port
    #[arg(long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub role: Role,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Role {
    /// Master clock: broadcasts START, STOP and CLOCK
    Clock {
        /// Initial tempo
        #[arg(long)]
        bpm: Option<f64>,

        /// Start the clock immediately
        #[arg(long)]
        autostart: bool,
    },
    /// Four-step kick that forwards its hits to the synth
    Rhythm,
    /// Sixteen-step four-voice drum machine
    Drums,
    /// Monophonic synth reacting to note events
    Synth {
        /// Only accept notes on these channels
        #[arg(long, value_delimiter = ',')]
        channels: Vec<u8>,
    },
    /// Logs every event seen on the channel
    Monitor,
    /// Colour on every beat and a flash on every note
    Visual,
    /// Frame-driven kick with no network at all
    Offline,
}

impl Role {
    pub fn default_name(&self) -> &'static str {
        match self {
            Role::Clock { .. } => "clock",
            Role::Rhythm => "rhythm",
            Role::Drums => "drums",
            Role::Synth { .. } => "synth",
            Role::Monitor => "monitor",
            Role::Visual => "visual",
            Role::Offline => "offline",
        }
    }
}

impl Args {
    pub fn node_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.role.default_name().to_string())
    }

    /// Command-line flags take precedence over file and environment settings
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(topology) = self.topology {
            settings.topology = topology;
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Role::Clock { bpm: Some(bpm), .. } = self.role {
            settings.bpm = bpm;
        }
    }
}

/// Identifier embedded in every datagram this process sends
pub fn source_id(node_name: &str) -> String {
    format!("{}-{}", node_name, std::process::id())
}
