//! Swarm API - contracts around the Kademlia topology.
//!
//! This crate defines the traits the topology exposes to its consumers and
//! the collaborators it consumes. Implementations live elsewhere:
//! `vertex-swarm-kademlia` for the topology, `vertex-net-peer-store` for the
//! in-memory address book, and the transport layer for the connector.
//!
//! # Core Concepts
//!
//! - [`SwarmTopology`] - Neighborhood depth, closest peers and peer registration
//! - [`SwarmTopologyProvider`] - Read-only status for RPC and debug output
//! - [`SwarmConnector`] - Dial a peer at its underlay address
//! - [`SwarmAddressBook`] - Resolve an overlay address to an underlay address
//!
//! # Design Principles
//!
//! - Traits define *what*, implementations define *how*
//! - Overlay addresses everywhere except the connector/address book boundary,
//!   which is where `Multiaddr` enters

#![warn(missing_docs)]

mod components;
mod error;
mod providers;

pub use components::*;
pub use error::*;
pub use providers::*;

pub use libp2p::Multiaddr;
pub use vertex_swarm_primitives::OverlayAddress;
