//! CLI entry point.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr, eyre};
use tracing::info;
use vertex_swarm_kademlia::KademliaArgs;

use crate::{
    args::{LogArgs, SimArgs},
    config::SimConfig,
    sim,
};

/// Vertex Swarm - Kademlia topology simulator
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Run a Kademlia topology against a synthetic network.
    Simulate(SimulateArgs),
}

/// Arguments for the 'simulate' command.
#[derive(Debug, Args)]
pub(crate) struct SimulateArgs {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Synthetic network configuration.
    #[command(flatten)]
    pub(crate) sim: SimArgs,

    /// Kademlia topology configuration.
    #[command(flatten)]
    pub(crate) kademlia: KademliaArgs,
}

/// Load the configuration and run a simulation.
pub(crate) async fn simulate(args: SimulateArgs) -> Result<()> {
    // defaults < env < config file
    let mut config = SimConfig::load(args.config.as_deref())?;

    // CLI has highest priority
    config.apply_cli(&args.sim, &args.kademlia);
    config.sim.validate().map_err(|e| eyre!(e))?;
    config.kademlia.validate().map_err(|e| eyre!(e))?;

    info!(
        peers = config.sim.peers,
        failure_rate = config.sim.failure_rate,
        latency_ms = config.sim.latency_ms,
        low_watermark = config.kademlia.low_watermark,
        saturation_peers = config.kademlia.saturation_peers,
        "simulation configured"
    );

    let report = sim::run(&config).await?;
    info!(
        depth = report.snapshot.depth,
        connected = report.snapshot.connected,
        known = report.snapshot.population,
        dials = report.dials,
        elapsed = ?report.elapsed,
        "simulation finished"
    );

    if config.sim.snapshot {
        let json = serde_json::to_string_pretty(&report.snapshot)
            .wrap_err("Failed to serialize topology snapshot")?;
        println!("{json}");
    }

    Ok(())
}
