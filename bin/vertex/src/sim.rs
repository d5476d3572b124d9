//! Synthetic network driving a [`KademliaTopology`].

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use rand::Rng;
use tracing::{debug, info};
use vertex_net_peer_store::MemoryAddressBook;
use vertex_swarm_api::{ConnectError, Multiaddr, OverlayAddress, SwarmAddressBook, SwarmConnector};
use vertex_swarm_kademlia::{KademliaConfig, KademliaTopology, TopologySnapshot, TopologyStats};
use vertex_swarm_test_utils::{random_address, underlay_for};

use crate::config::SimConfig;

/// Interval between settle checks.
const SETTLE_POLL: Duration = Duration::from_millis(100);

/// Consecutive unchanged polls before the topology counts as settled.
const SETTLE_ROUNDS: usize = 5;

/// Outcome of a simulation run.
#[derive(Debug)]
pub(crate) struct Report {
    pub(crate) snapshot: TopologySnapshot,
    pub(crate) dials: usize,
    pub(crate) elapsed: Duration,
}

/// Connector that reaches peers through the shared address book, with
/// jittered latency and random failures.
#[derive(Debug)]
struct SimConnector {
    book: Arc<MemoryAddressBook>,
    failure_rate: f64,
    latency: Duration,
    dials: AtomicUsize,
}

#[async_trait]
impl SwarmConnector for SimConnector {
    async fn connect(&self, underlay: &Multiaddr) -> Result<OverlayAddress, ConnectError> {
        self.dials.fetch_add(1, Ordering::Relaxed);
        let (fail, delay) = {
            let mut rng = rand::rng();
            (
                rng.random_bool(self.failure_rate.clamp(0.0, 1.0)),
                self.latency.mul_f64(rng.random_range(0.5..1.5)),
            )
        };
        tokio::time::sleep(delay).await;

        if fail {
            return Err(ConnectError::Dial {
                underlay: underlay.clone(),
                reason: "simulated failure".to_string(),
            });
        }
        let Some(overlay) = self.book.overlay_of(underlay) else {
            return Err(ConnectError::Dial {
                underlay: underlay.clone(),
                reason: "no such host".to_string(),
            });
        };
        Ok(overlay)
    }
}

/// Build the network, let the topology settle and report its final state.
pub(crate) async fn run(config: &SimConfig) -> Result<Report> {
    let started = Instant::now();
    let base = random_address();
    let book = Arc::new(MemoryAddressBook::new());
    let connector = Arc::new(SimConnector {
        book: book.clone(),
        failure_rate: config.sim.failure_rate,
        latency: Duration::from_millis(config.sim.latency_ms),
        dials: AtomicUsize::new(0),
    });

    let count = u32::try_from(config.sim.peers)
        .wrap_err("Too many simulated peers")?;
    let peers = (0..count)
        .map(|n| {
            let peer = random_address();
            book.put(peer, underlay_for(n)).map(|()| peer)
        })
        .collect::<Result<Vec<_>, _>>()
        .wrap_err("Failed to seed address book")?;

    let topology = KademliaTopology::new(
        base,
        book.clone(),
        connector.clone(),
        KademliaConfig::from(&config.kademlia),
    );
    info!(%base, peers = peers.len(), "simulated network ready");

    topology.spawn_manage_loop();
    let added = topology.add_peers(&peers)?;
    debug!(added, "fed peers to topology");

    let timeout = Duration::from_secs(config.sim.settle_secs);
    let stats = settle(&topology, timeout).await;
    info!(
        depth = stats.depth,
        connected = stats.connected_peers,
        "topology settled"
    );
    topology.log_status();

    if config.sim.churn > 0 {
        let victims: Vec<_> = topology
            .snapshot()
            .bins
            .into_iter()
            .flat_map(|bin| bin.connected_peers)
            .take(config.sim.churn)
            .collect();
        for peer in &victims {
            topology.disconnected(peer)?;
        }
        info!(
            disconnected = victims.len(),
            depth = topology.neighborhood_depth(),
            "churned peers"
        );

        let stats = settle(&topology, timeout).await;
        info!(
            depth = stats.depth,
            connected = stats.connected_peers,
            "topology recovered"
        );
        topology.log_status();
    }

    let snapshot = topology.snapshot();
    topology.close().await;

    Ok(Report {
        snapshot,
        dials: connector.dials.load(Ordering::Relaxed),
        elapsed: started.elapsed(),
    })
}

/// Wait until the stats stop changing or `timeout` expires.
async fn settle<B: SwarmAddressBook, C: SwarmConnector>(
    topology: &KademliaTopology<B, C>,
    timeout: Duration,
) -> TopologyStats {
    let deadline = Instant::now() + timeout;
    let mut last = topology.stats();
    let mut unchanged = 0;

    while unchanged < SETTLE_ROUNDS && Instant::now() < deadline {
        tokio::time::sleep(SETTLE_POLL).await;
        let stats = topology.stats();
        if stats == last {
            unchanged += 1;
        } else {
            debug!(
                depth = stats.depth,
                connected = stats.connected_peers,
                "topology changing"
            );
            unchanged = 0;
            last = stats;
        }
    }
    last
}
