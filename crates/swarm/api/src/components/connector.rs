//! Collaborators consumed by the topology: dialing and address resolution.

use std::sync::Arc;

use async_trait::async_trait;
use libp2p::Multiaddr;
use vertex_swarm_primitives::OverlayAddress;

use crate::{AddressBookError, ConnectError};

/// Dials peers at their underlay address.
///
/// Implemented by the transport layer. A call may take as long as the
/// connection attempt does; the topology never holds its lock across it.
#[async_trait]
pub trait SwarmConnector: Send + Sync + 'static {
    /// Connect to `underlay`, returning the overlay address the remote
    /// confirmed during the handshake.
    async fn connect(&self, underlay: &Multiaddr) -> Result<OverlayAddress, ConnectError>;
}

#[async_trait]
impl<T: SwarmConnector + ?Sized> SwarmConnector for Arc<T> {
    async fn connect(&self, underlay: &Multiaddr) -> Result<OverlayAddress, ConnectError> {
        (**self).connect(underlay).await
    }
}

/// Maps overlay addresses to underlay addresses.
#[auto_impl::auto_impl(Box, Arc)]
pub trait SwarmAddressBook: Send + Sync + 'static {
    /// Resolve the underlay address of `overlay`.
    ///
    /// Fails with [`AddressBookError::NotFound`] if the peer is unknown.
    fn get(&self, overlay: &OverlayAddress) -> Result<Multiaddr, AddressBookError>;

    /// Record (or replace) the underlay address of `overlay`.
    fn put(&self, overlay: OverlayAddress, underlay: Multiaddr) -> Result<(), AddressBookError>;

    /// Forget `overlay`. Unknown addresses are ignored.
    fn remove(&self, overlay: &OverlayAddress) -> Result<(), AddressBookError>;

    /// All overlay addresses with a known underlay.
    fn overlays(&self) -> Result<Vec<OverlayAddress>, AddressBookError>;
}
