//! Kademlia-based peer topology management for Swarm clients.
//!
//! This crate keeps a node connected to a Kademlia-shaped slice of the
//! overlay network and derives its neighbourhood depth.
//!
//! # Architecture
//!
//! The topology maintains two sets of peers, both binned by proximity order
//! to our own (base) address:
//! - `known`: every peer we have been told about, connected or not
//! - `connected`: peers with an established connection
//!
//! Both sets and the depth live behind a single lock. A background manage
//! loop is woken whenever the sets change; each wake-up runs one
//! reconciliation pass that walks known peers from the shallowest bin to the
//! deepest and dials those that are not connected and whose bin is not yet
//! saturated. Underlay addresses come from a [`SwarmAddressBook`], dials go
//! through a [`SwarmConnector`]. The lock is released while dialing.
//!
//! # Usage
//!
//! ```ignore
//! use vertex_swarm_kademlia::{KademliaConfig, KademliaTopology};
//!
//! let topology = KademliaTopology::new(base, address_book, connector, KademliaConfig::default());
//! topology.spawn_manage_loop();
//!
//! // Feed discovered peers
//! topology.add_peers(&discovered)?;
//!
//! // Route towards a chunk
//! let next_hop = topology.closest_peer(&chunk_address)?;
//!
//! topology.close().await;
//! ```

mod args;
mod config;
mod manage;
mod metrics;
mod pslice;
mod snapshot;
mod state;

pub use args::KademliaArgs;
pub use config::{
    DEFAULT_DIAL_TIMEOUT, DEFAULT_LOW_WATERMARK, DEFAULT_SATURATION_PEERS, KademliaConfig,
};
pub use pslice::{PSlice, Walk};
pub use snapshot::{BinSnapshot, TopologySnapshot, TopologyStats};

use std::{
    ops::ControlFlow,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tokio::{
    sync::{Notify, watch},
    task::JoinHandle,
};
use tracing::{debug, info};
use vertex_swarm_api::{
    SwarmAddressBook, SwarmConnector, SwarmTopology, SwarmTopologyProvider, TopologyError,
    TopologyResult,
};
use vertex_swarm_primitives::{OverlayAddress, Proximity, distance_cmp};

use crate::{metrics::KademliaMetrics, state::KademliaState};

/// Kademlia-based peer topology.
///
/// Generic over the address book used to resolve underlay addresses and the
/// connector used to dial them.
pub struct KademliaTopology<B, C> {
    /// Our own overlay address.
    base: OverlayAddress,

    /// Configuration.
    config: KademliaConfig,

    /// Resolves overlay addresses to dialable underlays.
    address_book: B,

    /// Dials peers.
    connector: C,

    /// Known and connected peers, depth and the closed flag.
    state: Mutex<KademliaState>,

    /// Notifier to wake the manage loop. Holds at most one permit, so bursts
    /// of changes collapse into a single pass.
    manage_notify: Notify,

    /// Tells the manage loop to exit.
    shutdown: watch::Sender<bool>,

    /// Handle of the manage loop, taken by `close`.
    task: Mutex<Option<JoinHandle<()>>>,

    /// Reconciliation passes run so far.
    passes: AtomicU64,

    metrics: KademliaMetrics,
}

impl<B, C> std::fmt::Debug for KademliaTopology<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("KademliaTopology")
            .field("base", &self.base)
            .field("depth", &state.depth)
            .field("known_peers", &state.known.len())
            .field("connected_peers", &state.connected.len())
            .finish_non_exhaustive()
    }
}

impl<B: SwarmAddressBook, C: SwarmConnector> KademliaTopology<B, C> {
    /// Create a new Kademlia topology around `base`.
    ///
    /// The manage loop is not started; call
    /// [`spawn_manage_loop`](Self::spawn_manage_loop) from within a tokio
    /// runtime.
    pub fn new(
        base: OverlayAddress,
        address_book: B,
        connector: C,
        config: KademliaConfig,
    ) -> std::sync::Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        std::sync::Arc::new(Self {
            base,
            config,
            address_book,
            connector,
            state: Mutex::new(KademliaState::default()),
            manage_notify: Notify::new(),
            shutdown,
            task: Mutex::new(None),
            passes: AtomicU64::new(0),
            metrics: KademliaMetrics::default(),
        })
    }

    /// Our own overlay address.
    pub fn base(&self) -> OverlayAddress {
        self.base
    }

    /// The configuration this topology runs with.
    pub fn config(&self) -> &KademliaConfig {
        &self.config
    }

    /// Calculate proximity order between base and a peer.
    fn proximity(&self, peer: &OverlayAddress) -> u8 {
        self.base.proximity(peer)
    }

    /// Register a peer supplied by discovery, bootstrap or persisted state.
    pub fn add_peer(&self, peer: OverlayAddress) -> TopologyResult<()> {
        let po = self.proximity(&peer);
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TopologyError::Closed);
            }
            if peer == self.base {
                return Err(TopologyError::OwnAddress);
            }
            if state.known.exists(&peer) || state.connected.exists(&peer) {
                return Err(TopologyError::AlreadyKnown(peer));
            }
            state.known.add(peer, po);
            self.metrics.record_state(&state);
        }

        debug!(%peer, po, "added known peer");
        self.manage_notify.notify_one();
        Ok(())
    }

    /// Register a batch of discovered peers.
    ///
    /// Peers that are already known and our own address are skipped. Returns
    /// how many peers were added; the manage loop is woken once if any were.
    pub fn add_peers(&self, peers: &[OverlayAddress]) -> TopologyResult<usize> {
        let (added, total) = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TopologyError::Closed);
            }
            let mut added = 0;
            for peer in peers.iter().filter(|peer| **peer != self.base) {
                if state.known.add(*peer, self.proximity(peer)) {
                    added += 1;
                }
            }
            self.metrics.record_state(&state);
            (added, state.known.len())
        };

        if added > 0 {
            debug!(added, total, "added known peers");
            self.manage_notify.notify_one();
        }
        Ok(added)
    }

    /// Notify that a peer has disconnected.
    ///
    /// The peer stays known and will be redialed by a later pass.
    pub fn disconnected(&self, peer: &OverlayAddress) -> TopologyResult<()> {
        self.drop_peer(peer, false)
    }

    /// Forget a peer entirely, connected or not.
    pub fn remove(&self, peer: &OverlayAddress) -> TopologyResult<()> {
        self.drop_peer(peer, true)
    }

    fn drop_peer(&self, peer: &OverlayAddress, forget: bool) -> TopologyResult<()> {
        let po = self.proximity(peer);
        let (was_connected, depth, change, connected) = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TopologyError::Closed);
            }
            let was_connected = state.connected.remove(peer, po);
            let was_known = forget && state.known.remove(peer, po);
            if !was_connected && !was_known {
                return Ok(());
            }
            let change = state.update_depth(self.config.low_watermark);
            self.metrics.record_state(&state);
            (was_connected, state.depth, change, state.connected.len())
        };

        if forget {
            debug!(%peer, po, depth, connected, "peer removed");
        } else if was_connected {
            debug!(%peer, po, depth, connected, "peer disconnected");
        }
        if let Some(old_depth) = change {
            self.depth_changed(old_depth, depth);
        }

        // Wake manage loop to find replacement
        self.manage_notify.notify_one();
        Ok(())
    }

    /// Record a successful dial.
    ///
    /// The result is dropped if the topology was closed or the peer removed
    /// while the dial was in flight.
    fn connected(&self, peer: OverlayAddress, po: u8) {
        let (depth, change, connected) = {
            let mut state = self.state.lock();
            if state.closed {
                debug!(%peer, "topology closed while dialing, discarding connection");
                return;
            }
            if !state.known.exists(&peer) {
                debug!(%peer, "peer removed while dialing, discarding connection");
                return;
            }
            if !state.connected.add(peer, po) {
                return;
            }
            let change = state.update_depth(self.config.low_watermark);
            self.metrics.record_state(&state);
            (state.depth, change, state.connected.len())
        };

        debug!(%peer, po, depth, connected, "peer connected");
        if let Some(old_depth) = change {
            self.depth_changed(old_depth, depth);
        }
        self.manage_notify.notify_one();
    }

    fn depth_changed(&self, old_depth: u8, new_depth: u8) {
        info!(old_depth, new_depth, "kademlia depth changed");
        self.log_status();
    }

    /// Get the current neighborhood depth.
    pub fn neighborhood_depth(&self) -> u8 {
        self.state.lock().depth
    }

    /// Connected peer closest to `target`.
    ///
    /// The highest proximity order wins; peers sharing it are ranked by XOR
    /// distance, which also orders by proximity, so a single comparison
    /// covers both.
    pub fn closest_peer(&self, target: &OverlayAddress) -> TopologyResult<OverlayAddress> {
        self.state
            .lock()
            .connected
            .iter()
            .map(|(_, peer)| peer)
            .max_by(|x, y| distance_cmp(target, x, y))
            .ok_or(TopologyError::NotFound)
    }

    /// Connected peers by descending `score`, closest to `target` first on ties.
    ///
    /// The order is computed from a snapshot; `score` runs without the lock.
    pub fn peers_scored<S>(
        &self,
        target: &OverlayAddress,
        score: S,
    ) -> std::vec::IntoIter<OverlayAddress>
    where
        S: Fn(&OverlayAddress) -> f64,
    {
        let peers: Vec<OverlayAddress> = self
            .state
            .lock()
            .connected
            .iter()
            .map(|(_, peer)| peer)
            .collect();

        let mut scored: Vec<_> = peers.into_iter().map(|p| (score(&p), p)).collect();
        scored.sort_by(|(sa, a), (sb, b)| {
            sb.total_cmp(sa).then_with(|| distance_cmp(target, b, a))
        });

        scored
            .into_iter()
            .map(|(_, peer)| peer)
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Visit connected peers in [`peers_scored`](Self::peers_scored) order.
    pub fn each_peer_scored<S, F, E>(
        &self,
        target: &OverlayAddress,
        score: S,
        mut visit: F,
    ) -> Result<(), E>
    where
        S: Fn(&OverlayAddress) -> f64,
        F: FnMut(&OverlayAddress) -> Result<ControlFlow<()>, E>,
    {
        for peer in self.peers_scored(target, score) {
            if visit(&peer)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Connected peers in bins at or deeper than depth.
    pub fn neighbors(&self) -> Vec<OverlayAddress> {
        let state = self.state.lock();
        state
            .connected
            .iter()
            .filter(|(po, _)| *po >= state.depth)
            .map(|(_, peer)| peer)
            .collect()
    }

    /// Whether `address` falls within our neighbourhood.
    pub fn is_within_depth(&self, address: &OverlayAddress) -> bool {
        self.proximity(address) >= self.neighborhood_depth()
    }

    /// Number of reconciliation passes the manage loop has run.
    ///
    /// Wake-ups posted while a pass is running collapse into one further
    /// pass, so this grows with bursts of changes, not with their size.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Get statistics about the topology.
    pub fn stats(&self) -> TopologyStats {
        TopologyStats::from(&*self.state.lock())
    }

    /// Capture the full topology, bin by bin.
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot::capture(self.base, self.config.low_watermark, &self.state.lock())
    }

    /// Log the current topology status showing bin populations.
    pub fn log_status(&self) {
        let (connected_bins, known_bins, depth) = {
            let state = self.state.lock();
            (
                state.connected.bin_sizes(),
                state.known.bin_sizes(),
                state.depth,
            )
        };

        let total_connected: usize = connected_bins.iter().sum();
        let total_known: usize = known_bins.iter().sum();
        let bins = render_bins(&connected_bins, &known_bins, depth);

        debug!(
            depth,
            connected = total_connected,
            known = total_known,
            bins = %bins,
            "kademlia topology"
        );
    }
}

/// Compact bin representation: `po:connected/known` for non-empty bins, the
/// depth bin bracketed.
fn render_bins(connected: &[usize], known: &[usize], depth: u8) -> String {
    let mut bin_status = String::new();
    for (po, (c, k)) in connected.iter().zip(known).enumerate() {
        if *c == 0 && *k == 0 {
            continue;
        }
        if !bin_status.is_empty() {
            bin_status.push(' ');
        }
        if po == usize::from(depth) {
            bin_status.push_str(&format!("[{po}:{c}/{k}]"));
        } else {
            bin_status.push_str(&format!("{po}:{c}/{k}"));
        }
    }

    if bin_status.is_empty() {
        bin_status = "(empty)".to_string();
    }
    bin_status
}

impl<B: SwarmAddressBook, C: SwarmConnector> SwarmTopology for KademliaTopology<B, C> {
    fn self_address(&self) -> OverlayAddress {
        self.base
    }

    fn neighborhood_depth(&self) -> u8 {
        Self::neighborhood_depth(self)
    }

    fn closest_peer(&self, target: &OverlayAddress) -> TopologyResult<OverlayAddress> {
        Self::closest_peer(self, target)
    }

    fn each_peer_scored<S, F, E>(
        &self,
        target: &OverlayAddress,
        score: S,
        visit: F,
    ) -> Result<(), E>
    where
        S: Fn(&OverlayAddress) -> f64,
        F: FnMut(&OverlayAddress) -> Result<ControlFlow<()>, E>,
    {
        Self::each_peer_scored(self, target, score, visit)
    }

    fn add_peer(&self, peer: OverlayAddress) -> TopologyResult<()> {
        Self::add_peer(self, peer)
    }

    fn disconnected(&self, peer: &OverlayAddress) -> TopologyResult<()> {
        Self::disconnected(self, peer)
    }

    fn remove(&self, peer: &OverlayAddress) -> TopologyResult<()> {
        Self::remove(self, peer)
    }
}

impl<B: SwarmAddressBook, C: SwarmConnector> SwarmTopologyProvider for KademliaTopology<B, C> {
    fn overlay_address(&self) -> String {
        hex::encode(self.base.as_slice())
    }

    fn depth(&self) -> u8 {
        self.neighborhood_depth()
    }

    fn connected_peers_count(&self) -> usize {
        self.state.lock().connected.len()
    }

    fn known_peers_count(&self) -> usize {
        self.state.lock().known.len()
    }

    fn bin_sizes(&self) -> Vec<(usize, usize)> {
        let state = self.state.lock();
        let connected = state.connected.bin_sizes();
        let known = state.known.bin_sizes();
        connected
            .iter()
            .zip(known.iter())
            .map(|(c, k)| (*c, *k))
            .collect()
    }

    fn connected_peers_in_bin(&self, po: u8) -> Vec<String> {
        self.state
            .lock()
            .connected
            .peers_in_bin(po)
            .iter()
            .map(|addr| hex::encode(addr.as_slice()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Arc;
    use vertex_net_peer_store::MemoryAddressBook;
    use vertex_swarm_test_utils::MockConnector;

    type TestTopology = KademliaTopology<Arc<MemoryAddressBook>, Arc<MockConnector>>;

    fn addr_from_byte(b: u8) -> OverlayAddress {
        let mut bytes = [0u8; 32];
        bytes[0] = b;
        OverlayAddress::from(bytes)
    }

    /// Topology without a manage loop, so peer sets only change through the
    /// calls a test makes.
    fn make_topology(base: OverlayAddress) -> Arc<TestTopology> {
        let book = Arc::new(MemoryAddressBook::new());
        let connector = Arc::new(MockConnector::new(book.clone()));
        KademliaTopology::new(base, book, connector, KademliaConfig::default())
    }

    fn connect(topology: &TestTopology, peer: OverlayAddress) {
        let _ = topology.add_peer(peer);
        topology.connected(peer, topology.proximity(&peer));
    }

    #[test]
    fn test_topology_creation() {
        let base = addr_from_byte(0x00);
        let topology = make_topology(base);

        assert_eq!(topology.self_address(), base);
        assert_eq!(topology.neighborhood_depth(), 0);
        assert_eq!(topology.stats(), TopologyStats::default());
    }

    #[test]
    fn test_add_peer_errors() {
        let base = addr_from_byte(0x00);
        let topology = make_topology(base);
        let peer = addr_from_byte(0x80);

        assert!(topology.add_peer(peer).is_ok());
        assert_matches!(topology.add_peer(peer), Err(TopologyError::AlreadyKnown(p)) if p == peer);
        assert_matches!(topology.add_peer(base), Err(TopologyError::OwnAddress));

        // still a duplicate once connected
        topology.connected(peer, 0);
        assert_matches!(
            topology.add_peer(peer),
            Err(TopologyError::AlreadyKnown(_))
        );
    }

    #[test]
    fn test_add_peers_batch() {
        let base = addr_from_byte(0x00);
        let topology = make_topology(base);

        let peers = [addr_from_byte(0x80), addr_from_byte(0x40), base];
        assert_eq!(topology.add_peers(&peers), Ok(2));
        assert_eq!(topology.add_peers(&peers), Ok(0));
        assert_eq!(topology.stats().known_peers, 2);
    }

    #[test]
    fn test_disconnect_keeps_peer_known() {
        let topology = make_topology(addr_from_byte(0x00));
        let peer = addr_from_byte(0x80);

        connect(&topology, peer);
        assert_eq!(topology.stats().connected_peers, 1);

        topology.disconnected(&peer).unwrap();
        let stats = topology.stats();
        assert_eq!(stats.connected_peers, 0);
        assert_eq!(stats.known_peers, 1); // kept for reconnection

        // unknown peers are ignored
        assert!(topology.disconnected(&addr_from_byte(0x40)).is_ok());
    }

    #[test]
    fn test_remove_forgets_peer() {
        let topology = make_topology(addr_from_byte(0x00));
        let peer = addr_from_byte(0x80);

        connect(&topology, peer);
        topology.remove(&peer).unwrap();
        assert_eq!(topology.stats(), TopologyStats::default());

        // can be registered again afterwards
        assert!(topology.add_peer(peer).is_ok());
    }

    #[test]
    fn test_connection_discarded_for_removed_peer() {
        let topology = make_topology(addr_from_byte(0x00));
        let peer = addr_from_byte(0x80);

        topology.add_peer(peer).unwrap();
        topology.remove(&peer).unwrap();
        topology.connected(peer, 0);
        assert_eq!(topology.stats().connected_peers, 0);
    }

    #[test]
    fn test_closest_peer() {
        let topology = make_topology(addr_from_byte(0x00));
        assert_matches!(
            topology.closest_peer(&addr_from_byte(0x21)),
            Err(TopologyError::NotFound)
        );

        let peer_po0 = addr_from_byte(0x80); // PO 0 from base
        let peer_po1 = addr_from_byte(0x40); // PO 1 from base
        let peer_po2 = addr_from_byte(0x20); // PO 2 from base
        let peer_po2b = addr_from_byte(0x30); // PO 2 from base
        for peer in [peer_po0, peer_po1, peer_po2, peer_po2b] {
            connect(&topology, peer);
        }

        let closest = |b| topology.closest_peer(&addr_from_byte(b)).unwrap();
        assert_eq!(closest(0x21), peer_po2);
        assert_eq!(closest(0x31), peer_po2b);
        assert_eq!(closest(0xff), peer_po0);
    }

    #[test]
    fn test_closest_peer_breaks_ties_by_distance() {
        let topology = make_topology(addr_from_byte(0x00));

        // identical first two bytes: proximity to the target is capped for both
        let mut x = [0u8; 32];
        x[0] = 0x20;
        x[31] = 0x01;
        let mut y = x;
        y[31] = 0x02;
        let (x, y) = (OverlayAddress::from(x), OverlayAddress::from(y));
        connect(&topology, x);
        connect(&topology, y);

        let mut target = [0u8; 32];
        target[0] = 0x20;
        target[31] = 0x03;
        let target = OverlayAddress::from(target);
        assert_eq!(x.proximity(&target), y.proximity(&target));
        // 0x03 ^ 0x02 = 0x01 beats 0x03 ^ 0x01 = 0x02
        assert_eq!(topology.closest_peer(&target).unwrap(), y);
    }

    #[test]
    fn test_each_peer_scored() {
        let topology = make_topology(addr_from_byte(0x00));
        let a = addr_from_byte(0x80);
        let b = addr_from_byte(0x40);
        let c = addr_from_byte(0x20);
        for peer in [a, b, c] {
            connect(&topology, peer);
        }

        let score = |peer: &OverlayAddress| if *peer == a { 2.0 } else { 1.0 };
        let target = addr_from_byte(0x21);

        // ties broken by closeness to the target
        let order: Vec<_> = topology.peers_scored(&target, score).collect();
        assert_eq!(order, vec![a, c, b]);

        // visitor can stop early
        let mut seen = Vec::new();
        let res: Result<(), ()> = topology.each_peer_scored(&target, score, |p| {
            seen.push(*p);
            if seen.len() == 2 {
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        });
        assert!(res.is_ok());
        assert_eq!(seen, vec![a, c]);

        // or fail
        let res = topology.each_peer_scored(&target, score, |_| Err("stop"));
        assert_eq!(res, Err("stop"));
    }

    #[test]
    fn test_neighbors_and_depth_membership() {
        let topology = make_topology(addr_from_byte(0x00));

        // bins 0, 1 and two peers at 2: depth 2
        for peer in [
            addr_from_byte(0x80),
            addr_from_byte(0x40),
            addr_from_byte(0x20),
            addr_from_byte(0x30),
        ] {
            connect(&topology, peer);
        }
        assert_eq!(topology.neighborhood_depth(), 2);

        let neighbors = topology.neighbors();
        assert_eq!(neighbors, vec![addr_from_byte(0x20), addr_from_byte(0x30)]);

        assert!(topology.is_within_depth(&addr_from_byte(0x01)));
        assert!(!topology.is_within_depth(&addr_from_byte(0x41)));
    }

    #[test]
    fn test_provider() {
        let topology = make_topology(addr_from_byte(0x00));
        connect(&topology, addr_from_byte(0x80));
        topology.add_peer(addr_from_byte(0x40)).unwrap();

        let provider: &dyn SwarmTopologyProvider = &*topology;
        assert_eq!(provider.overlay_address(), "00".repeat(32));
        assert_eq!(provider.connected_peers_count(), 1);
        assert_eq!(provider.known_peers_count(), 2);
        assert_eq!(provider.bin_sizes()[..2], [(1, 1), (0, 1)]);
        assert_eq!(
            provider.connected_peers_in_bin(0),
            vec![format!("80{}", "00".repeat(31))]
        );
    }

    #[test]
    fn test_render_bins() {
        let mut connected = [0usize; 16];
        let mut known = [0usize; 16];
        assert_eq!(render_bins(&connected, &known, 0), "(empty)");

        connected[0] = 2;
        known[0] = 3;
        known[2] = 1;
        assert_eq!(render_bins(&connected, &known, 2), "0:2/3 [2:0/1]");
    }
}
