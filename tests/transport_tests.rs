use crossbeam::channel::{unbounded, Receiver};
use patchsync::transport::codec;
use patchsync::{
    Event, EventSink, LoopbackBus, PatchError, Topology, Transport, UdpConfig, UdpTransport,
};
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

fn listen_into(transport: &dyn Transport) -> Receiver<Event> {
    let (tx, rx) = unbounded();
    transport
        .listen(Box::new(move |event| {
            let _ = tx.send(event);
        }))
        .unwrap();
    rx
}

fn unicast(node_name: &str, peers: &[(&str, u16)]) -> UdpConfig {
    UdpConfig {
        topology: Topology::Unicast,
        broadcast_addr: "255.255.255.255".to_string(),
        port: 0,
        peers: peers
            .iter()
            .map(|(name, port)| (name.to_string(), *port))
            .collect::<BTreeMap<_, _>>(),
        node_name: node_name.to_string(),
    }
}

fn broadcast(node_name: &str, port: u16) -> UdpConfig {
    UdpConfig {
        topology: Topology::Broadcast,
        broadcast_addr: "127.255.255.255".to_string(),
        port,
        peers: BTreeMap::new(),
        node_name: node_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_suppresses_own_events() {
        let bus = LoopbackBus::new();
        let clock = bus.attach("clock-1");
        let synth = bus.attach("synth-1");
        let clock_rx = listen_into(&clock);
        let synth_rx = listen_into(&synth);

        clock.send(&Event::start());
        clock.send(&Event::clock());

        assert_eq!(
            synth_rx.try_iter().collect::<Vec<_>>(),
            vec![Event::start(), Event::clock()]
        );
        assert!(clock_rx.try_recv().is_err());
        assert_eq!(clock.stats().suppressed, 2);
        assert_eq!(clock.stats().sent, 2);
        assert_eq!(synth.stats().delivered, 2);
    }

    #[test]
    fn test_corrupt_datagrams_are_counted_and_skipped() {
        let bus = LoopbackBus::new();
        let node = bus.attach("node");
        let rx = listen_into(&node);

        bus.inject(b"not json at all");
        bus.inject(br#"{"source":"x","type":"warp_drive"}"#);
        bus.inject(&codec::encode("other", &Event::note_on(2, 64, 90)));

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![Event::note_on(2, 64, 90)]
        );
        let stats = node.stats();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.decode_errors, 2);
        assert_eq!(stats.delivered, 1);
    }

    #[test]
    fn test_closed_loopback_stops_delivery() {
        let bus = LoopbackBus::new();
        let a = bus.attach("a");
        let b = bus.attach("b");
        let b_rx = listen_into(&b);
        assert_eq!(bus.subscriber_count(), 1);

        b.close();
        assert_eq!(bus.subscriber_count(), 0);
        a.send(&Event::clock());
        assert!(b_rx.try_recv().is_err());

        let relisten = b.listen(Box::new(|_| {}));
        assert!(matches!(relisten, Err(PatchError::Closed)));
    }

    #[test]
    fn test_close_during_delivery_drops_pending_event() {
        let bus = LoopbackBus::new();
        let slow = bus.attach("slow");
        let late = bus.attach("late");
        let sender = bus.attach("sender");

        // Subscribers are served in attach order, so "late" waits behind "slow"
        slow.listen(Box::new(|_| thread::sleep(Duration::from_millis(200)))).unwrap();
        let late_rx = listen_into(&late);

        let delivery = thread::spawn(move || sender.send(&Event::clock()));
        thread::sleep(Duration::from_millis(50));
        late.close();
        delivery.join().unwrap();

        assert!(late_rx.try_recv().is_err());
        assert_eq!(late.stats().delivered, 0);
        assert_eq!(slow.stats().delivered, 1);
    }

    #[test]
    fn test_broadcast_peers_share_one_port() {
        let a = UdpTransport::open(&broadcast("a", 47700), "a-bcast").unwrap();
        let b = UdpTransport::open(&broadcast("b", 47700), "b-bcast").unwrap();
        let a_rx = listen_into(&a);
        let b_rx = listen_into(&b);

        a.send(&Event::clock());
        let got = b_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(got, Event::clock());

        // The sender hears its own datagram and drops it
        let deadline = Instant::now() + Duration::from_secs(2);
        while a.stats().suppressed == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(a.stats().suppressed, 1);
        assert!(a_rx.try_recv().is_err());
        assert_eq!(b.stats().delivered, 1);
    }

    #[test]
    fn test_unicast_round_trip_on_loopback() {
        let peers = [("left", 47611), ("right", 47612)];
        let left = UdpTransport::open(&unicast("left", &peers), "left-test").unwrap();
        let right = UdpTransport::open(&unicast("right", &peers), "right-test").unwrap();
        assert_eq!(left.destinations().len(), 1);
        assert_eq!(left.destinations()[0].port(), 47612);

        let rx = listen_into(&right);
        left.send(&Event::note_on(10, 36, 127));
        let got = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(got, Event::note_on(10, 36, 127));

        right.close();
        left.send(&Event::note_off(10, 36, 0));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(right.stats().delivered >= 1);
    }

    #[test]
    fn test_unicast_requires_own_port() {
        let peers = [("clock", 47620)];
        let result = UdpTransport::open(&unicast("ghost", &peers), "ghost-test");
        assert!(matches!(result, Err(PatchError::UnknownPeer(name)) if name == "ghost"));
    }

    #[test]
    fn test_port_clash_fails_startup() {
        let peers = [("one", 47631), ("two", 47631)];
        let _first = UdpTransport::open(&unicast("one", &peers), "one-test").unwrap();
        let second = UdpTransport::open(&unicast("two", &peers), "two-test");
        assert!(matches!(second, Err(PatchError::Bind { .. })));
    }
}
