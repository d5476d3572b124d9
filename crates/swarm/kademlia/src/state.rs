//! Peer sets and depth, guarded together by the topology lock.

use std::collections::HashSet;

use vertex_swarm_primitives::OverlayAddress;

use crate::pslice::{PSlice, Walk};

/// Mutable topology state.
///
/// Every connected peer is also known. Depth is derived from the connected
/// set and must be refreshed with [`update_depth`](Self::update_depth) after
/// each change to it.
#[derive(Debug, Default)]
pub(crate) struct KademliaState {
    /// Peers we have an address for, connected or not.
    pub(crate) known: PSlice,
    /// Peers with an established connection.
    pub(crate) connected: PSlice,
    /// Current neighbourhood depth.
    pub(crate) depth: u8,
    /// Set once the topology has been shut down.
    pub(crate) closed: bool,
}

impl KademliaState {
    /// Neighbourhood depth of the connected set.
    ///
    /// Walks connected bins from the deepest one until `low_watermark` peers
    /// have been counted; that bin is the candidate depth. A hole at or above
    /// the candidate (an empty bin shallower than the deepest occupied one)
    /// pulls depth down to the hole.
    pub(crate) fn compute_depth(&self, low_watermark: usize) -> u8 {
        if self.connected.len() <= low_watermark {
            return 0;
        }

        let mut count = 0;
        let mut candidate = 0;
        for (po, _) in self.connected.iter_rev() {
            count += 1;
            if count >= low_watermark {
                candidate = po;
                break;
            }
        }

        match self.connected.shallowest_empty() {
            Some(hole) if hole <= candidate => hole,
            _ => candidate,
        }
    }

    /// Recompute depth, returning the previous value if it changed.
    pub(crate) fn update_depth(&mut self, low_watermark: usize) -> Option<u8> {
        let new_depth = self.compute_depth(low_watermark);
        let old_depth = std::mem::replace(&mut self.depth, new_depth);
        (old_depth != new_depth).then_some(old_depth)
    }

    /// Whether bin `po` already holds enough connected peers.
    ///
    /// Bins at or deeper than depth are never saturated.
    pub(crate) fn bin_saturated(&self, po: u8, saturation_peers: usize) -> bool {
        po < self.depth && self.connected.bin_size(po) >= saturation_peers
    }

    /// Next known peer worth dialing.
    ///
    /// Bins are scanned shallowest first. Connected peers, peers in
    /// `attempted` and peers in saturated bins are skipped.
    pub(crate) fn next_candidate(
        &self,
        attempted: &HashSet<OverlayAddress>,
        saturation_peers: usize,
    ) -> Option<(OverlayAddress, u8)> {
        let mut found = None;
        let Ok(()) = self.known.each_bin(|peer, po| -> Result<Walk, std::convert::Infallible> {
            if self.bin_saturated(po, saturation_peers) {
                return Ok(Walk::NextBin);
            }
            if self.connected.exists(peer) || attempted.contains(peer) {
                return Ok(Walk::Continue);
            }
            found = Some((*peer, po));
            Ok(Walk::Stop)
        });
        found
    }
}
