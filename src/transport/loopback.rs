use super::{codec, Counters, EventCallback, EventSink, Inbound, Transport, TransportStats};
use crate::error::{PatchError, Result};
use crate::event::Event;
use crate::lock;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

struct Subscriber {
    id: u64,
    inbound: Arc<Inbound>,
}

/// In-process stand-in for the shared broadcast channel.
///
/// Every attached transport sees every datagram, encoded and decoded exactly as
/// on the network, so self-suppression and decode handling behave the same.
/// Delivery is synchronous on the sender's thread.
#[derive(Clone, Default)]
pub struct LoopbackBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    next_id: Arc<AtomicU64>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, source: impl Into<String>) -> LoopbackTransport {
        LoopbackTransport {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            source: source.into(),
            bus: self.clone(),
            closed: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Pushes raw bytes to every subscriber, as a foreign sender would
    pub fn inject(&self, bytes: &[u8]) {
        // Snapshot first so callbacks may send without holding the bus lock
        let targets: Vec<Arc<Inbound>> = lock(&self.subscribers)
            .iter()
            .map(|s| s.inbound.clone())
            .collect();
        for inbound in targets {
            inbound.dispatch(bytes);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }
}

pub struct LoopbackTransport {
    id: u64,
    source: String,
    bus: LoopbackBus,
    closed: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl EventSink for LoopbackTransport {
    fn send(&self, event: &Event) {
        if self.closed.load(Ordering::SeqCst) {
            debug!("Loopback '{}' closed, dropping {} event", self.source, event.kind);
            return;
        }
        self.counters.record_send(true);
        self.bus.inject(&codec::encode(&self.source, event));
    }
}

impl Transport for LoopbackTransport {
    fn source(&self) -> &str {
        &self.source
    }

    fn listen(&self, callback: EventCallback) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PatchError::Closed);
        }
        let inbound = Inbound::new(
            &self.source,
            callback,
            self.counters.clone(),
            self.closed.clone(),
        );
        lock(&self.bus.subscribers).push(Subscriber {
            id: self.id,
            inbound: Arc::new(inbound),
        });
        Ok(())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            lock(&self.bus.subscribers).retain(|s| s.id != self.id);
        }
    }

    fn stats(&self) -> TransportStats {
        self.counters.snapshot()
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        self.close();
    }
}
