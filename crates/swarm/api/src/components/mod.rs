//! Swarm node components - traits at the topology boundary.

mod connector;
mod topology;

pub use connector::*;
pub use topology::*;
