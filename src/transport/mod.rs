//! Event transport between nodes
//!
//! This module moves [`Event`]s between processes:
//! - [`UdpTransport`] for real deployments, in either the shared-broadcast or
//!   the per-node unicast topology
//! - [`LoopbackBus`] for several nodes inside one process (tests, demos)
//!
//! Both tag every outgoing datagram with the sender's identifier and run inbound
//! datagrams through [`Inbound::dispatch`], which drops anything malformed or
//! sent by the receiving node itself before the callback sees it.

pub mod codec;
mod loopback;
mod udp;

pub use codec::{DecodeError, Envelope};
pub use loopback::{LoopbackBus, LoopbackTransport};
pub use udp::{UdpConfig, UdpTransport};

use crate::error::Result;
use crate::event::Event;
use log::{trace, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Application callback invoked for every accepted inbound event
pub type EventCallback = Box<dyn Fn(Event) + Send + Sync + 'static>;

/// Anything events can be handed to without waiting
pub trait EventSink {
    fn send(&self, event: &Event);
}

/// A node's attachment to the shared channel.
pub trait Transport: EventSink + Send + Sync {
    /// Identifier embedded in every datagram this transport sends
    fn source(&self) -> &str;

    /// Starts delivering inbound events to `callback`. Called once per transport.
    fn listen(&self, callback: EventCallback) -> Result<()>;

    /// Stops listening and releases the sockets. No callback fires afterwards.
    fn close(&self);

    fn stats(&self) -> TransportStats;
}

/// Point-in-time copy of a transport's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub sent: u64,
    pub send_errors: u64,
    pub received: u64,
    pub delivered: u64,
    pub suppressed: u64,
    pub decode_errors: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    sent: AtomicU64,
    send_errors: AtomicU64,
    received: AtomicU64,
    delivered: AtomicU64,
    suppressed: AtomicU64,
    decode_errors: AtomicU64,
}

impl Counters {
    pub(crate) fn record_send(&self, ok: bool) {
        if ok {
            self.sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.send_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> TransportStats {
        TransportStats {
            sent: self.sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}

/// Receive-side pipeline shared by every transport
pub(crate) struct Inbound {
    source: String,
    callback: EventCallback,
    counters: Arc<Counters>,
    /// Owning transport's flag; set by `close`
    closed: Arc<AtomicBool>,
}

impl Inbound {
    pub(crate) fn new(
        source: &str,
        callback: EventCallback,
        counters: Arc<Counters>,
        closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source: source.to_string(),
            callback,
            counters,
            closed,
        }
    }

    /// Decodes one datagram and hands it to the callback unless it is
    /// malformed or our own. Returns whether the callback ran.
    pub(crate) fn dispatch(&self, bytes: &[u8]) -> bool {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        let envelope = match codec::decode(bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Discarding datagram for '{}': {}", self.source, e);
                return false;
            }
        };

        if envelope.source == self.source {
            self.counters.suppressed.fetch_add(1, Ordering::Relaxed);
            trace!("Suppressed own {} event", envelope.event.kind);
            return false;
        }

        // Checked last so a close that lands mid-delivery still wins
        if self.closed.load(Ordering::SeqCst) {
            trace!("Transport '{}' closed, dropping {} event", self.source, envelope.event.kind);
            return false;
        }

        self.counters.delivered.fetch_add(1, Ordering::Relaxed);
        (self.callback)(envelope.event);
        true
    }
}
