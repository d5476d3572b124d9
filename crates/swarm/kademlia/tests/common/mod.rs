//! Shared harness for topology integration tests.

#![allow(dead_code, unreachable_pub)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use vertex_net_peer_store::MemoryAddressBook;
use vertex_swarm_api::{OverlayAddress, SwarmAddressBook};
use vertex_swarm_kademlia::{KademliaConfig, KademliaTopology};
use vertex_swarm_test_utils::{
    MockConnector, random_address, random_address_at, underlay_for, wait_until,
};

pub type Topology = KademliaTopology<Arc<MemoryAddressBook>, Arc<MockConnector>>;

/// Upper bound for anything the manage loop is expected to do.
pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// A topology wired to a mock network of peers.
pub struct Net {
    pub base: OverlayAddress,
    pub book: Arc<MemoryAddressBook>,
    pub connector: Arc<MockConnector>,
    pub topology: Arc<Topology>,
    next: AtomicU32,
}

impl Net {
    pub fn new() -> Self {
        Self::with(KademliaConfig::default(), Duration::ZERO)
    }

    pub fn with(config: KademliaConfig, latency: Duration) -> Self {
        init_tracing();
        let base = random_address();
        let book = Arc::new(MemoryAddressBook::new());
        let connector = Arc::new(MockConnector::new(book.clone()).with_latency(latency));
        let topology = KademliaTopology::new(base, book.clone(), connector.clone(), config);
        topology.spawn_manage_loop();
        Self {
            base,
            book,
            connector,
            topology,
            next: AtomicU32::new(0),
        }
    }

    /// New peer at proximity `po` from base, reachable through the book.
    pub fn peer_at(&self, po: u8) -> OverlayAddress {
        let peer = random_address_at(&self.base, po);
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        self.book.put(peer, underlay_for(n)).unwrap();
        peer
    }

    pub fn add(&self, peers: &[OverlayAddress]) {
        for peer in peers {
            self.topology.add_peer(*peer).unwrap();
        }
    }

    pub fn connected(&self) -> usize {
        self.topology.stats().connected_peers
    }

    pub fn is_connected(&self, peer: &OverlayAddress) -> bool {
        self.topology
            .snapshot()
            .bins
            .iter()
            .any(|bin| bin.connected_peers.contains(peer))
    }

    /// Wait for `count` connected peers, then check depth.
    pub async fn expect(&self, count: usize, depth: u8) {
        assert!(
            wait_until(WAIT, || self.connected() == count).await,
            "expected {count} connected peers, have {}",
            self.connected()
        );
        assert_eq!(
            self.topology.neighborhood_depth(),
            depth,
            "with {count} connected peers"
        );
    }

    /// Wait until at least `count` dials have been made.
    pub async fn wait_dials(&self, count: usize) {
        assert!(
            wait_until(WAIT, || self.connector.dials() >= count).await,
            "expected {count} dials, have {}",
            self.connector.dials()
        );
    }
}
