//! Kademlia topology metrics.

use metrics::{Counter, Gauge};

use crate::state::KademliaState;

/// Kademlia topology metrics.
#[derive(Clone, Debug)]
pub(crate) struct KademliaMetrics {
    /// Current neighbourhood depth
    depth: Gauge,
    /// Number of known peers (connected peers included)
    known_peers: Gauge,
    /// Number of connected peers
    connected_peers: Gauge,
    /// Number of dials started
    dials_total: Counter,
    /// Number of dials that failed, timed out or reached the wrong overlay
    dial_failures_total: Counter,
    /// Number of candidates whose underlay could not be resolved
    resolve_failures_total: Counter,
    /// Number of reconciliation passes run
    passes_total: Counter,
}

impl Default for KademliaMetrics {
    fn default() -> Self {
        Self {
            depth: metrics::gauge!("kademlia_depth"),
            known_peers: metrics::gauge!("kademlia_known_peers"),
            connected_peers: metrics::gauge!("kademlia_connected_peers"),
            dials_total: metrics::counter!("kademlia_dials_total"),
            dial_failures_total: metrics::counter!("kademlia_dial_failures_total"),
            resolve_failures_total: metrics::counter!("kademlia_resolve_failures_total"),
            passes_total: metrics::counter!("kademlia_passes_total"),
        }
    }
}

impl KademliaMetrics {
    /// Publishes the gauges derived from the peer sets.
    pub(crate) fn record_state(&self, state: &KademliaState) {
        self.depth.set(f64::from(state.depth));
        self.known_peers.set(state.known.len() as f64);
        self.connected_peers.set(state.connected.len() as f64);
    }

    pub(crate) fn inc_dials(&self) {
        self.dials_total.increment(1);
    }

    pub(crate) fn inc_dial_failures(&self) {
        self.dial_failures_total.increment(1);
    }

    pub(crate) fn inc_resolve_failures(&self) {
        self.resolve_failures_total.increment(1);
    }

    pub(crate) fn inc_passes(&self) {
        self.passes_total.increment(1);
    }
}
