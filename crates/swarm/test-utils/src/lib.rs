//! Test utilities and mocks for vertex-swarm crates.
//!
//! - Overlay address generators that land in a chosen proximity order bin
//! - Deterministic underlay addresses
//! - [`MockConnector`], a `SwarmConnector` backed by an in-memory address
//!   book
//! - [`wait_until`] for polling asynchronous state in tests

mod address;
mod connector;

pub use address::{UNDERLAY_HOSTS, random_address, random_address_at, underlay_for};
pub use connector::MockConnector;

use std::time::Duration;

/// Poll `condition` every few milliseconds until it holds or `timeout`
/// expires. Returns the last result.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
