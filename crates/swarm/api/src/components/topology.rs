//! Topology and neighborhood awareness using overlay addresses.

use std::ops::ControlFlow;

use vertex_swarm_primitives::OverlayAddress;

use crate::TopologyResult;

/// Neighborhood awareness trait - who is "close" in the overlay address space.
///
/// Mutating calls fail with [`TopologyError::Closed`](crate::TopologyError::Closed)
/// once the topology has been shut down. Reads keep answering from the last
/// known state.
#[auto_impl::auto_impl(&, Arc)]
pub trait SwarmTopology: Send + Sync {
    /// Get our own overlay address.
    fn self_address(&self) -> OverlayAddress;

    /// Get the current neighborhood depth.
    fn neighborhood_depth(&self) -> u8;

    /// Connected peer with the highest proximity order to `target`.
    ///
    /// Fails with `NotFound` when no peers are connected.
    fn closest_peer(&self, target: &OverlayAddress) -> TopologyResult<OverlayAddress>;

    /// Visit connected peers in descending `score` order.
    ///
    /// Peers with equal scores are visited closest to `target` first. The
    /// visitor stops the walk with `ControlFlow::Break`; an error aborts it
    /// and is returned to the caller. Each call starts a fresh walk.
    fn each_peer_scored<S, F, E>(
        &self,
        target: &OverlayAddress,
        score: S,
        visit: F,
    ) -> Result<(), E>
    where
        S: Fn(&OverlayAddress) -> f64,
        F: FnMut(&OverlayAddress) -> Result<ControlFlow<()>, E>;

    /// Register a peer supplied by discovery, bootstrap or persisted state.
    fn add_peer(&self, peer: OverlayAddress) -> TopologyResult<()>;

    /// Notify that a peer has disconnected at the transport level.
    fn disconnected(&self, peer: &OverlayAddress) -> TopologyResult<()>;

    /// Administratively forget a peer.
    fn remove(&self, peer: &OverlayAddress) -> TopologyResult<()>;
}
