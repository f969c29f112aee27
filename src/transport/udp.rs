use super::{codec, Counters, EventCallback, EventSink, Inbound, Transport, TransportStats};
use crate::config::Topology;
use crate::error::{PatchError, Result};
use crate::event::Event;
use crate::lock;
use crate::scheduler::{Scheduler, ThreadScheduler};
use log::{debug, info, trace, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound on how long `close` waits for the listener to notice
const RECV_POLL: Duration = Duration::from_millis(50);

/// Addressing for one node's UDP transport
#[derive(Debug, Clone)]
pub struct UdpConfig {
    pub topology: Topology,
    pub broadcast_addr: String,
    pub port: u16,
    pub peers: BTreeMap<String, u16>,
    pub node_name: String,
}

impl UdpConfig {
    /// Where every outgoing datagram is sent
    fn destinations(&self) -> Result<Vec<SocketAddr>> {
        match self.topology {
            Topology::Broadcast => {
                let ip: IpAddr = self.broadcast_addr.parse().map_err(|_| {
                    PatchError::Config(format!(
                        "invalid broadcast address '{}'",
                        self.broadcast_addr
                    ))
                })?;
                Ok(vec![SocketAddr::new(ip, self.port)])
            }
            Topology::Unicast => Ok(self
                .peers
                .iter()
                .filter(|(name, _)| **name != self.node_name)
                .map(|(_, port)| SocketAddr::from((Ipv4Addr::LOCALHOST, *port)))
                .collect()),
        }
    }

    fn listen_addr(&self) -> Result<SocketAddr> {
        match self.topology {
            Topology::Broadcast => Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))),
            Topology::Unicast => {
                let port = self
                    .peers
                    .get(&self.node_name)
                    .ok_or_else(|| PatchError::UnknownPeer(self.node_name.clone()))?;
                Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, *port)))
            }
        }
    }
}

/// Datagram transport over real sockets.
///
/// The receive socket is bound at `open` so a port clash fails startup, but
/// nothing is read until [`Transport::listen`] spawns the listener thread.
pub struct UdpTransport {
    source: String,
    destinations: Vec<SocketAddr>,
    sender: Mutex<Option<UdpSocket>>,
    receiver: Mutex<Option<UdpSocket>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    closed: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl UdpTransport {
    pub fn open(config: &UdpConfig, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let destinations = config.destinations()?;
        let listen_addr = config.listen_addr()?;

        let receiver = match config.topology {
            Topology::Broadcast => bind_shared(listen_addr)?,
            Topology::Unicast => UdpSocket::bind(listen_addr).map_err(|e| PatchError::Bind {
                addr: listen_addr.to_string(),
                source: e,
            })?,
        };
        receiver.set_read_timeout(Some(RECV_POLL))?;

        let send_addr = match config.topology {
            Topology::Broadcast => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            Topology::Unicast => SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        };
        let sender = UdpSocket::bind(send_addr).map_err(|e| PatchError::Bind {
            addr: send_addr.to_string(),
            source: e,
        })?;
        if config.topology == Topology::Broadcast {
            sender.set_broadcast(true)?;
        }
        sender.set_nonblocking(true)?;

        info!(
            "UDP transport '{}' listening on {}, sending to {:?}",
            source, listen_addr, destinations
        );

        Ok(Self {
            source,
            destinations,
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            listener: Mutex::new(None),
            closed: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn destinations(&self) -> &[SocketAddr] {
        &self.destinations
    }
}

/// Binds the shared broadcast port so several nodes on one host can hold it
fn bind_shared(addr: SocketAddr) -> Result<UdpSocket> {
    let bind_err = |e| PatchError::Bind {
        addr: addr.to_string(),
        source: e,
    };
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true).map_err(bind_err)?;
    socket.set_broadcast(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;
    Ok(socket.into())
}

fn receive_loop(socket: UdpSocket, inbound: Inbound, closed: Arc<AtomicBool>) {
    let mut buf = [0u8; codec::MAX_DATAGRAM];
    while !closed.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((size, from)) => {
                if closed.load(Ordering::SeqCst) {
                    break;
                }
                trace!("{} bytes from {}", size, from);
                inbound.dispatch(&buf[..size]);
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => {
                warn!("Error in receive loop: {}", e);
                thread::sleep(Duration::from_millis(1));
            }
        }
    }
    debug!("Receive loop exited");
}

impl EventSink for UdpTransport {
    fn send(&self, event: &Event) {
        let bytes = codec::encode(&self.source, event);
        let guard = lock(&self.sender);
        let Some(socket) = guard.as_ref() else {
            debug!("Transport closed, dropping {} event", event.kind);
            return;
        };

        for dest in &self.destinations {
            match socket.send_to(&bytes, dest) {
                Ok(_) => self.counters.record_send(true),
                Err(e) => {
                    self.counters.record_send(false);
                    debug!("Dropped {} event to {}: {}", event.kind, dest, e);
                }
            }
        }
    }
}

impl Transport for UdpTransport {
    fn source(&self) -> &str {
        &self.source
    }

    fn listen(&self, callback: EventCallback) -> Result<()> {
        let socket = lock(&self.receiver).take().ok_or(PatchError::Closed)?;
        let closed = self.closed.clone();
        let inbound = Inbound::new(
            &self.source,
            callback,
            self.counters.clone(),
            closed.clone(),
        );

        let handle = ThreadScheduler::new().spawn(&format!("{}-rx", self.source), move || {
            receive_loop(socket, inbound, closed)
        })?;
        *lock(&self.listener) = Some(handle);
        Ok(())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        lock(&self.sender).take();
        lock(&self.receiver).take();

        if let Some(handle) = lock(&self.listener).take() {
            // A callback that closes its own transport must not join itself
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                warn!("Listener for '{}' panicked", self.source);
            }
        }
        info!("UDP transport '{}' closed", self.source);
    }

    fn stats(&self) -> TransportStats {
        self.counters.snapshot()
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.close();
    }
}
