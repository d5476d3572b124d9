//! Core primitive types for Ethereum Swarm nodes.
//!
//! This crate provides the overlay address type and the Kademlia proximity
//! metric, kept separate so the topology and its collaborators share them
//! without depending on each other.
//!
//! # Types
//!
//! - [`OverlayAddress`] - Swarm overlay address (32 bytes, Kademlia routing)
//! - [`Proximity`] - proximity order between two overlay addresses
//! - [`distance_cmp`] - full XOR-distance comparison against a target

#![cfg_attr(not(feature = "std"), no_std)]

mod distance;
mod proximity;

pub use distance::{Distance, distance_cmp};
pub use proximity::{MAX_BINS, MAX_PO, Proximity, proximity};

/// Overlay address for Swarm routing and peer identification.
///
/// A 32-byte opaque identifier. Equality is byte-wise; the only ordering
/// defined between addresses is proximity to a reference address.
///
/// # Overlay vs Underlay
///
/// - **Overlay (OverlayAddress)**: the node's logical identity, used for
///   Kademlia binning, depth and routing decisions.
/// - **Underlay (Multiaddr)**: the transport location used to dial a peer.
///   The address book maps overlay to underlay.
pub type OverlayAddress = alloy_primitives::B256;
