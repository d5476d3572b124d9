//! Vertex Swarm Kademlia topology simulator.

mod args;
mod cli;
mod config;
mod logging;
mod sim;

use clap::Parser;
use color_eyre::eyre;
use tracing::info;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    info!("Starting Vertex {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Simulate(args) => cli::simulate(args).await,
    }
}
