//! Kademlia topology configuration.
//!
//! # Water Mark Concepts
//!
//! The topology uses two thresholds:
//!
//! - **Low watermark** (`low_watermark`, default 2): number of peers in the
//!   deepest consecutive bins that constitute the nearest neighbourhood. With
//!   this many connected peers or fewer, depth is 0.
//!
//! - **Saturation** (`saturation_peers`, default 2): bins shallower than depth
//!   stop being dialed proactively once they hold this many connected peers.
//!   Bins at or deeper than depth are never saturated.

use std::time::Duration;

/// Default minimum neighbourhood size for depth calculation (low water mark).
pub const DEFAULT_LOW_WATERMARK: usize = 2;

/// Default connected peers per shallow bin before it is considered saturated.
pub const DEFAULT_SATURATION_PEERS: usize = 2;

/// Default upper bound for a single dial.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for Kademlia topology management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KademliaConfig {
    /// Peers in the deepest bins required before depth leaves 0.
    pub low_watermark: usize,

    /// Connected peers per bin (below depth) before the bin is saturated.
    pub saturation_peers: usize,

    /// Maximum time a single connection attempt may take.
    pub dial_timeout: Duration,
}

impl Default for KademliaConfig {
    fn default() -> Self {
        Self {
            low_watermark: DEFAULT_LOW_WATERMARK,
            saturation_peers: DEFAULT_SATURATION_PEERS,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}

impl KademliaConfig {
    /// Set the low watermark for depth calculation.
    pub fn with_low_watermark(mut self, count: usize) -> Self {
        self.low_watermark = count;
        self
    }

    /// Set the saturation target per bin.
    pub fn with_saturation_peers(mut self, count: usize) -> Self {
        self.saturation_peers = count;
        self
    }

    /// Set the dial timeout.
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }
}
