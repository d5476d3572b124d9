//! Logging and simulation CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};
use vertex_swarm_test_utils::UNDERLAY_HOSTS;

/// Default number of simulated peers.
const DEFAULT_PEERS: usize = 200;

/// Default probability that a dial fails.
const DEFAULT_FAILURE_RATE: f64 = 0.1;

/// Default mean dial latency in milliseconds.
const DEFAULT_LATENCY_MS: u64 = 20;

/// Default upper bound for waiting on the topology to settle, in seconds.
const DEFAULT_SETTLE_SECS: u64 = 30;

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub(crate) struct LogArgs {
    /// Silence all output.
    #[arg(short, long)]
    pub(crate) quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count)]
    #[serde(skip)] // CLI-only, count action doesn't make sense in config
    pub(crate) verbosity: u8,

    /// Log filter directive (e.g., "vertex_swarm_kademlia=trace").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    pub(crate) json: bool,
}

/// Synthetic network configuration.
#[derive(Debug, Args, Clone, PartialEq, Serialize, Deserialize)]
#[command(next_help_heading = "Simulation")]
#[serde(default)]
pub(crate) struct SimArgs {
    /// Number of peers in the synthetic network.
    #[arg(long = "sim.peers", default_value_t = DEFAULT_PEERS)]
    pub(crate) peers: usize,

    /// Probability (0.0 to 1.0) that a dial fails.
    #[arg(long = "sim.failure-rate", default_value_t = DEFAULT_FAILURE_RATE)]
    pub(crate) failure_rate: f64,

    /// Mean dial latency in milliseconds.
    #[arg(long = "sim.latency", value_name = "MS", default_value_t = DEFAULT_LATENCY_MS)]
    pub(crate) latency_ms: u64,

    /// Give up waiting for the topology to settle after this many seconds.
    #[arg(
        long = "sim.settle-timeout",
        value_name = "SECS",
        default_value_t = DEFAULT_SETTLE_SECS
    )]
    pub(crate) settle_secs: u64,

    /// Disconnect this many connected peers after settling and settle again.
    #[arg(long = "sim.churn", default_value_t = 0)]
    pub(crate) churn: usize,

    /// Print the final topology snapshot as JSON.
    #[arg(long = "sim.snapshot")]
    pub(crate) snapshot: bool,
}

impl Default for SimArgs {
    fn default() -> Self {
        Self {
            peers: DEFAULT_PEERS,
            failure_rate: DEFAULT_FAILURE_RATE,
            latency_ms: DEFAULT_LATENCY_MS,
            settle_secs: DEFAULT_SETTLE_SECS,
            churn: 0,
            snapshot: false,
        }
    }
}

impl SimArgs {
    /// Validate argument combinations.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.peers > UNDERLAY_HOSTS {
            return Err(format!("sim.peers cannot exceed {UNDERLAY_HOSTS}"));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(format!(
                "sim.failure-rate must be within 0..=1, got {}",
                self.failure_rate
            ));
        }
        if self.churn > self.peers {
            return Err("sim.churn cannot exceed sim.peers".to_string());
        }
        Ok(())
    }
}
