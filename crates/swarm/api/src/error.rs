//! Error types for topology operations and its collaborators.
//!
//! Each error variant carries typed data (not strings) where the caller can
//! act on it.

use std::time::Duration;

use libp2p::Multiaddr;
use vertex_swarm_primitives::OverlayAddress;

/// Error type for topology operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// The peer is already registered (known or connected).
    #[error("peer already known: {0}")]
    AlreadyKnown(OverlayAddress),

    /// The node's own overlay address cannot be registered as a peer.
    #[error("cannot add own overlay address as a peer")]
    OwnAddress,

    /// No connected peer could answer the query.
    #[error("no connected peers")]
    NotFound,

    /// The topology has been shut down.
    #[error("topology closed")]
    Closed,
}

/// Result type for topology operations.
pub type TopologyResult<T> = core::result::Result<T, TopologyError>;

/// Error returned by a [`SwarmAddressBook`](crate::SwarmAddressBook).
#[derive(Debug, thiserror::Error)]
pub enum AddressBookError {
    /// No underlay address is recorded for the overlay.
    #[error("no underlay address for {0}")]
    NotFound(OverlayAddress),

    /// The backing store failed.
    #[error("address book storage error: {0}")]
    Storage(String),
}

/// Error returned when dialing a peer fails.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The transport could not establish a connection.
    #[error("dial {underlay} failed: {reason}")]
    Dial {
        /// Address that was dialed.
        underlay: Multiaddr,
        /// Description of the transport failure.
        reason: String,
    },

    /// The connection attempt did not finish in time.
    #[error("dial timed out after {0:?}")]
    Timeout(Duration),

    /// The remote confirmed a different overlay than the one dialed.
    #[error("overlay mismatch: dialed {expected}, remote is {actual}")]
    OverlayMismatch {
        /// Overlay the topology intended to reach.
        expected: OverlayAddress,
        /// Overlay confirmed by the remote.
        actual: OverlayAddress,
    },
}
