//! Point-in-time views of the topology.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use vertex_swarm_primitives::{MAX_PO, OverlayAddress};

use crate::state::KademliaState;

/// Statistics about the topology state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopologyStats {
    /// Number of known peers, connected ones included.
    pub known_peers: usize,
    /// Number of connected peers.
    pub connected_peers: usize,
    /// Current neighborhood depth.
    pub depth: u8,
}

impl From<&KademliaState> for TopologyStats {
    fn from(state: &KademliaState) -> Self {
        Self {
            known_peers: state.known.len(),
            connected_peers: state.connected.len(),
            depth: state.depth,
        }
    }
}

/// Serializable dump of the whole topology, one entry per bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// Our own overlay address.
    pub base: OverlayAddress,
    /// Seconds since the Unix epoch when the snapshot was taken.
    pub timestamp: u64,
    /// Low watermark the depth was computed with.
    pub low_watermark: usize,
    /// Neighborhood depth.
    pub depth: u8,
    /// Number of known peers, connected ones included.
    pub population: usize,
    /// Number of connected peers.
    pub connected: usize,
    /// Bins from the shallowest to the deepest.
    pub bins: Vec<BinSnapshot>,
}

/// Peers of a single proximity order bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSnapshot {
    /// Proximity order of the bin.
    pub po: u8,
    /// Known peers in insertion order.
    pub known_peers: Vec<OverlayAddress>,
    /// Connected peers in insertion order.
    pub connected_peers: Vec<OverlayAddress>,
}

impl TopologySnapshot {
    pub(crate) fn capture(
        base: OverlayAddress,
        low_watermark: usize,
        state: &KademliaState,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let bins = (0..=MAX_PO)
            .map(|po| BinSnapshot {
                po,
                known_peers: state.known.peers_in_bin(po).to_vec(),
                connected_peers: state.connected.peers_in_bin(po).to_vec(),
            })
            .collect();

        Self {
            base,
            timestamp,
            low_watermark,
            depth: state.depth,
            population: state.known.len(),
            connected: state.connected.len(),
            bins,
        }
    }
}
