//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`VERTEX_` prefix, `__` between sections)
//! 4. Defaults

use std::path::Path;

use eyre::{Result, WrapErr};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use vertex_swarm_kademlia::KademliaArgs;

use crate::args::SimArgs;

/// Complete simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SimConfig {
    /// Synthetic network configuration.
    pub(crate) sim: SimArgs,

    /// Kademlia topology configuration.
    pub(crate) kademlia: KademliaArgs,
}

impl SimConfig {
    /// Load configuration from defaults, environment, and config file.
    /// CLI overrides should be applied separately after loading.
    pub(crate) fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(SimConfig::default()))
            .merge(Env::prefixed("VERTEX_").split("__"));

        if let Some(path) = config_path {
            if !path.exists() {
                eyre::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().wrap_err("Failed to load configuration")
    }

    /// Apply CLI arguments on top of the loaded configuration.
    ///
    /// A flag left at its default value does not override the file or the
    /// environment.
    pub(crate) fn apply_cli(&mut self, sim: &SimArgs, kademlia: &KademliaArgs) {
        let (sim_defaults, kademlia_defaults) = (SimArgs::default(), KademliaArgs::default());

        override_if_set(&mut self.sim.peers, &sim.peers, &sim_defaults.peers);
        override_if_set(
            &mut self.sim.failure_rate,
            &sim.failure_rate,
            &sim_defaults.failure_rate,
        );
        override_if_set(
            &mut self.sim.latency_ms,
            &sim.latency_ms,
            &sim_defaults.latency_ms,
        );
        override_if_set(
            &mut self.sim.settle_secs,
            &sim.settle_secs,
            &sim_defaults.settle_secs,
        );
        override_if_set(&mut self.sim.churn, &sim.churn, &sim_defaults.churn);
        override_if_set(
            &mut self.sim.snapshot,
            &sim.snapshot,
            &sim_defaults.snapshot,
        );

        override_if_set(
            &mut self.kademlia.low_watermark,
            &kademlia.low_watermark,
            &kademlia_defaults.low_watermark,
        );
        override_if_set(
            &mut self.kademlia.saturation_peers,
            &kademlia.saturation_peers,
            &kademlia_defaults.saturation_peers,
        );
        override_if_set(
            &mut self.kademlia.dial_timeout,
            &kademlia.dial_timeout,
            &kademlia_defaults.dial_timeout,
        );
    }
}

fn override_if_set<T: PartialEq + Clone>(target: &mut T, cli: &T, default: &T) {
    if cli != default {
        *target = cli.clone();
    }
}
