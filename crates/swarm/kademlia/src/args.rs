//! CLI arguments for Kademlia topology configuration.

use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::config::*;

/// Kademlia topology CLI arguments.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Kademlia Topology")]
#[serde(default)]
pub struct KademliaArgs {
    /// Peers in the deepest bins required before depth leaves 0
    #[arg(long = "kademlia.low-watermark", default_value_t = DEFAULT_LOW_WATERMARK)]
    pub low_watermark: usize,

    /// Connected peers per shallow bin before it stops being dialed
    #[arg(long = "kademlia.saturation-peers", default_value_t = DEFAULT_SATURATION_PEERS)]
    pub saturation_peers: usize,

    /// Maximum duration of a single dial, in seconds
    #[arg(
        long = "kademlia.dial-timeout",
        value_name = "SECS",
        default_value_t = DEFAULT_DIAL_TIMEOUT.as_secs()
    )]
    pub dial_timeout: u64,
}

impl Default for KademliaArgs {
    fn default() -> Self {
        Self {
            low_watermark: DEFAULT_LOW_WATERMARK,
            saturation_peers: DEFAULT_SATURATION_PEERS,
            dial_timeout: DEFAULT_DIAL_TIMEOUT.as_secs(),
        }
    }
}

impl KademliaArgs {
    /// Validate argument combinations.
    pub fn validate(&self) -> Result<(), String> {
        if self.low_watermark == 0 {
            return Err("kademlia.low-watermark must be at least 1".to_string());
        }
        if self.saturation_peers == 0 {
            return Err("kademlia.saturation-peers must be at least 1".to_string());
        }
        if self.dial_timeout == 0 {
            return Err("kademlia.dial-timeout must be at least 1 second".into());
        }
        Ok(())
    }
}

impl From<&KademliaArgs> for KademliaConfig {
    fn from(args: &KademliaArgs) -> Self {
        KademliaConfig::default()
            .with_low_watermark(args.low_watermark)
            .with_saturation_peers(args.saturation_peers)
            .with_dial_timeout(Duration::from_secs(args.dial_timeout))
    }
}
