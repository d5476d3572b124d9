//! The manage loop: reconciliation passes, dialing and shutdown.

use std::{
    collections::HashSet,
    sync::{Arc, atomic::Ordering},
};

use tokio::sync::watch;
use tracing::{debug, trace, warn};
use vertex_swarm_api::{ConnectError, Multiaddr, SwarmAddressBook, SwarmConnector};
use vertex_swarm_primitives::OverlayAddress;

use crate::KademliaTopology;

impl<B: SwarmAddressBook, C: SwarmConnector> KademliaTopology<B, C> {
    /// Spawn the manage loop on the current tokio runtime.
    ///
    /// Calling it again while the loop runs, or after [`close`](Self::close),
    /// does nothing.
    pub fn spawn_manage_loop(self: &Arc<Self>) {
        // `close` marks the state closed before it takes the handle, so
        // checking under the task lock leaves no window for a stray loop.
        let mut task = self.task.lock();
        if task.is_some() || self.is_closed() {
            return;
        }

        let this = Arc::clone(self);
        let shutdown = self.shutdown.subscribe();
        *task = Some(tokio::spawn(async move { this.manage(shutdown).await }));
    }

    /// Shut the topology down and wait for the manage loop to exit.
    ///
    /// A dial in flight is allowed to finish but its result is discarded.
    /// Mutating calls fail with `Closed` afterwards. Closing twice is a no-op.
    pub async fn close(&self) {
        let already_closed = std::mem::replace(&mut self.state.lock().closed, true);
        if already_closed {
            return;
        }

        self.shutdown.send_replace(true);
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(error) = task.await
        {
            warn!(%error, "kademlia manage loop terminated abnormally");
        }
        debug!(base = %self.base, "kademlia topology closed");
    }

    async fn manage(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        debug!(base = %self.base, "kademlia manage loop started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|closed| *closed) => {
                    debug!("kademlia manage loop shutting down");
                    break;
                }
                _ = self.manage_notify.notified() => {
                    trace!("manage loop woken by notification");
                }
            }
            self.reconcile(&shutdown).await;
        }
    }

    /// One reconciliation pass.
    ///
    /// Candidates are picked one at a time from the current state so every
    /// decision sees the connections made earlier in the same pass.
    async fn reconcile(&self, shutdown: &watch::Receiver<bool>) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.metrics.inc_passes();
        let mut attempted = HashSet::new();

        loop {
            if *shutdown.borrow() {
                break;
            }
            let candidate = self
                .state
                .lock()
                .next_candidate(&attempted, self.config.saturation_peers);
            let Some((peer, po)) = candidate else {
                break;
            };

            attempted.insert(peer);
            trace!(%peer, po, "selected dial candidate");
            self.connect(peer, po).await;
        }

        trace!(attempted = attempted.len(), "reconciliation pass finished");
    }

    async fn connect(&self, peer: OverlayAddress, po: u8) {
        let underlay = match self.address_book.get(&peer) {
            Ok(underlay) => underlay,
            Err(error) => {
                self.metrics.inc_resolve_failures();
                debug!(%peer, %error, "cannot resolve peer underlay, skipping");
                return;
            }
        };

        self.metrics.inc_dials();
        debug!(%peer, po, %underlay, "dialing peer");

        match self.dial(peer, &underlay).await {
            Ok(()) => self.connected(peer, po),
            Err(error @ ConnectError::OverlayMismatch { .. }) => {
                self.metrics.inc_dial_failures();
                warn!(%peer, %underlay, %error, "dialed peer answered with another overlay");
            }
            Err(error) => {
                self.metrics.inc_dial_failures();
                debug!(%peer, %underlay, %error, "failed to connect to peer");
            }
        }
    }

    async fn dial(&self, peer: OverlayAddress, underlay: &Multiaddr) -> Result<(), ConnectError> {
        let timeout = self.config.dial_timeout;
        let actual = tokio::time::timeout(timeout, self.connector.connect(underlay))
            .await
            .map_err(|_| ConnectError::Timeout(timeout))??;

        if actual != peer {
            return Err(ConnectError::OverlayMismatch {
                expected: peer,
                actual,
            });
        }
        Ok(())
    }
}
