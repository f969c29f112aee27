//! Wire encoding: one flat JSON object per datagram.
//!
//! ```text
//! {"source":"drums-4242","type":"note_on","note":36,"velocity":127,"channel":10}
//! ```
//!
//! Unknown fields are ignored and absent payload fields stay absent.

use crate::event::{Event, EventKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest datagram a node will read
pub const MAX_DATAGRAM: usize = 1024;

#[derive(Debug, Serialize, Deserialize)]
struct WireRecord {
    source: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    velocity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    control: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<u16>,
}

/// Why a datagram was rejected
#[derive(Debug)]
pub enum DecodeError {
    Utf8(std::str::Utf8Error),
    Json(serde_json::Error),
    UnknownKind(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Utf8(e) => write!(f, "datagram is not UTF-8: {}", e),
            DecodeError::Json(e) => write!(f, "malformed record: {}", e),
            DecodeError::UnknownKind(kind) => write!(f, "unknown event type '{}'", kind),
        }
    }
}

impl std::error::Error for DecodeError {}

/// A decoded datagram: the event plus the identifier of whoever sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub source: String,
    pub event: Event,
}

pub fn encode(source: &str, event: &Event) -> Vec<u8> {
    let record = WireRecord {
        source: source.to_string(),
        kind: event.kind.as_str().to_string(),
        note: event.note,
        velocity: event.velocity,
        channel: event.channel,
        control: event.control,
        value: event.value,
    };
    // Serializing a struct of strings and integers cannot fail
    serde_json::to_vec(&record).unwrap_or_default()
}

pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(DecodeError::Utf8)?;
    let record: WireRecord = serde_json::from_str(text.trim()).map_err(DecodeError::Json)?;
    let kind = EventKind::from_name(&record.kind)
        .ok_or_else(|| DecodeError::UnknownKind(record.kind.clone()))?;

    Ok(Envelope {
        source: record.source,
        event: Event {
            kind,
            note: record.note,
            velocity: record.velocity,
            channel: record.channel,
            control: record.control,
            value: record.value,
        },
    })
}
