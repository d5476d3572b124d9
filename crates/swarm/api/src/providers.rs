//! Status provider traits.
//!
//! These traits define the data interfaces that status and debug surfaces
//! depend on, so they can render any topology implementation.

/// Provider trait for topology and network status information.
///
/// # Implementors
///
/// - `KademliaTopology` - Production Kademlia-based topology
#[auto_impl::auto_impl(Arc, Box)]
pub trait SwarmTopologyProvider: Send + Sync + 'static {
    /// Get the node's overlay address as a hex-encoded string.
    fn overlay_address(&self) -> String;

    /// Get the current neighborhood depth.
    fn depth(&self) -> u8;

    /// Get the count of currently connected peers.
    fn connected_peers_count(&self) -> usize;

    /// Get the count of known peers (connected peers are also known).
    fn known_peers_count(&self) -> usize;

    /// Get bin sizes for each proximity order.
    ///
    /// Returns a vector of `(connected, known)` tuples, one per bin.
    fn bin_sizes(&self) -> Vec<(usize, usize)>;

    /// Get connected peer overlay addresses in a specific bin.
    ///
    /// Returns hex-encoded overlay addresses.
    fn connected_peers_in_bin(&self, po: u8) -> Vec<String>;
}
