//! Mock connector.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use vertex_net_peer_store::MemoryAddressBook;
use vertex_swarm_api::{ConnectError, Multiaddr, OverlayAddress, SwarmConnector};

/// Connector that "dials" by looking the underlay up in a shared
/// [`MemoryAddressBook`].
///
/// Every call is counted. Overlays marked with [`fail`](Self::fail) refuse
/// the connection, overlays passed to [`impersonate`](Self::impersonate)
/// answer with another overlay, and underlays missing from the book fail
/// like an unreachable host.
#[derive(Debug)]
pub struct MockConnector {
    book: Arc<MemoryAddressBook>,
    failing: Mutex<HashSet<OverlayAddress>>,
    answers: Mutex<HashMap<OverlayAddress, OverlayAddress>>,
    latency: Duration,
    dials: AtomicUsize,
}

impl MockConnector {
    pub fn new(book: Arc<MemoryAddressBook>) -> Self {
        Self {
            book,
            failing: Mutex::new(HashSet::new()),
            answers: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
            dials: AtomicUsize::new(0),
        }
    }

    /// Delay every dial by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make dials to `overlay` fail.
    pub fn fail(&self, overlay: OverlayAddress) {
        self.failing.lock().insert(overlay);
    }

    /// Let dials to `overlay` succeed again.
    pub fn recover(&self, overlay: &OverlayAddress) {
        self.failing.lock().remove(overlay);
    }

    /// Answer dials to `dialed` with `actual` as the confirmed overlay.
    pub fn impersonate(&self, dialed: OverlayAddress, actual: OverlayAddress) {
        self.answers.lock().insert(dialed, actual);
    }

    /// Number of dials made so far.
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Reset the dial counter.
    pub fn reset_dials(&self) {
        self.dials.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl SwarmConnector for MockConnector {
    async fn connect(&self, underlay: &Multiaddr) -> Result<OverlayAddress, ConnectError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let Some(overlay) = self.book.overlay_of(underlay) else {
            return Err(ConnectError::Dial {
                underlay: underlay.clone(),
                reason: "host unreachable".to_string(),
            });
        };

        if self.failing.lock().contains(&overlay) {
            return Err(ConnectError::Dial {
                underlay: underlay.clone(),
                reason: "connection refused".to_string(),
            });
        }

        let answer = self.answers.lock().get(&overlay).copied();
        Ok(answer.unwrap_or(overlay))
    }
}
