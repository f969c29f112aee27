// config.rs

use crate::error::{PatchError, Result};
use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BPM: f64 = 120.0;
pub const MIN_BPM: f64 = 40.0;
pub const MAX_BPM: f64 = 240.0;
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BROADCAST_ADDR: &str = "255.255.255.255";
pub const DEFAULT_CONFIG_FILE: &str = "patchsync.toml";
pub const ENV_PREFIX: &str = "PATCHSYNC";

/// How datagrams reach the other nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// One broadcast address and port shared by every node
    Broadcast,
    /// One loopback port per node, taken from the peer map
    Unicast,
}

impl std::str::FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "broadcast" => Ok(Topology::Broadcast),
            "unicast" => Ok(Topology::Unicast),
            other => Err(format!("unknown topology '{}'", other)),
        }
    }
}

/// Node settings, layered from defaults, an optional TOML file and
/// `PATCHSYNC_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub topology: Topology,
    pub broadcast_addr: String,
    pub port: u16,
    /// Logical node name to loopback port, used by the unicast topology
    pub peers: BTreeMap<String, u16>,
    pub bpm: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub frame_interval_ms: u64,
    /// Force a running node to stop after this long without a clock pulse
    pub stop_timeout_ms: Option<u64>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        let peers = [
            ("clock", 5000),
            ("rhythm", 5001),
            ("drums", 5002),
            ("synth", 5003),
            ("monitor", 5004),
            ("visual", 5005),
        ]
        .into_iter()
        .map(|(name, port)| (name.to_string(), port))
        .collect();

        Self {
            topology: Topology::Broadcast,
            broadcast_addr: DEFAULT_BROADCAST_ADDR.to_string(),
            port: DEFAULT_PORT,
            peers,
            bpm: DEFAULT_BPM,
            min_bpm: MIN_BPM,
            max_bpm: MAX_BPM,
            frame_interval_ms: 16,
            stop_timeout_ms: None,
            log_level: "debug".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `path` (or `patchsync.toml` when present) and the
    /// environment. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let raw = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?;

        let settings: Settings = raw.try_deserialize()?;
        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_bpm.is_finite() && self.max_bpm.is_finite()) || self.min_bpm <= 0.0 {
            return Err(PatchError::Config(format!(
                "invalid BPM range {}..{}",
                self.min_bpm, self.max_bpm
            )));
        }
        if self.min_bpm > self.max_bpm {
            return Err(PatchError::Config(format!(
                "min_bpm {} is above max_bpm {}",
                self.min_bpm, self.max_bpm
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(PatchError::Config(
                "frame_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn stop_timeout(&self) -> Option<Duration> {
        self.stop_timeout_ms.map(Duration::from_millis)
    }

    pub fn bpm_range(&self) -> crate::clock::BpmRange {
        crate::clock::BpmRange::new(self.min_bpm, self.max_bpm)
    }

    pub fn transport_config(&self, node_name: &str) -> crate::transport::UdpConfig {
        info!(
            "Using {:?} topology for node '{}'",
            self.topology, node_name
        );
        crate::transport::UdpConfig {
            topology: self.topology,
            broadcast_addr: self.broadcast_addr.clone(),
            port: self.port,
            peers: self.peers.clone(),
            node_name: node_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_ports() {
        let settings = Settings::default();
        assert_eq!(settings.peers.get("clock"), Some(&5000));
        assert_eq!(settings.peers.get("synth"), Some(&5003));
        assert_eq!(settings.topology, Topology::Broadcast);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_inverted_bpm_range_is_rejected() {
        let settings = Settings {
            min_bpm: 200.0,
            max_bpm: 100.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_topology_parses_case_insensitively() {
        assert_eq!("Unicast".parse::<Topology>(), Ok(Topology::Unicast));
        assert!("mesh".parse::<Topology>().is_err());
    }
}
