//! Address book implementations.
//!
//! The topology resolves overlay addresses to dialable underlay addresses
//! through a [`SwarmAddressBook`]. This crate provides the in-memory book
//! used by the node when no persistent store is configured, and by tests.

mod memory;

pub use memory::MemoryAddressBook;
pub use vertex_swarm_api::{AddressBookError, SwarmAddressBook};
