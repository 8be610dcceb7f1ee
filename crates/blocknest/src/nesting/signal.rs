// ABOUTME: Per-block "decoration complete" signals and the one-shot relocation gate.
// ABOUTME: Relocation awaits the blocks it targets instead of sleeping; waits are bounded by a timeout.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use dom_query::NodeId;
use tokio::sync::watch;

/// Tracks which blocks of a page finished structural decoration.
///
/// Each block gets a `watch` channel created on first use, whether that use is a
/// waiter subscribing or the decorator publishing completion, so ordering between
/// the two does not matter.
#[derive(Debug, Default)]
pub struct DecorationTracker {
    channels: Mutex<HashMap<NodeId, watch::Sender<bool>>>,
    relocated: Mutex<HashSet<NodeId>>,
}

impl DecorationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(&self, id: NodeId) -> watch::Receiver<bool> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(id)
            .or_insert_with(|| watch::channel(false).0)
            .subscribe()
    }

    /// Publish that block `id` finished structural decoration.
    pub fn complete(&self, id: NodeId) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(id)
            .or_insert_with(|| watch::channel(false).0)
            .send_replace(true);
    }

    pub fn is_complete(&self, id: NodeId) -> bool {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.get(&id).map_or(false, |tx| *tx.borrow())
    }

    /// Wait until every block in `ids` has completed, or `bound` elapses.
    ///
    /// On timeout, returns the blocks still pending.
    pub async fn wait_for(&self, ids: &[NodeId], bound: Duration) -> Result<(), Vec<NodeId>> {
        if ids.is_empty() {
            return Ok(());
        }

        let waits = ids.iter().map(|id| {
            let mut rx = self.subscribe(*id);
            async move {
                // The sender lives as long as the tracker, so this only errs on teardown.
                let _ = rx.wait_for(|done| *done).await;
            }
        });

        match tokio::time::timeout(bound, futures::future::join_all(waits)).await {
            Ok(_) => Ok(()),
            Err(_) => Err(ids
                .iter()
                .copied()
                .filter(|id| !self.is_complete(*id))
                .collect()),
        }
    }

    /// Claim the one-shot relocation for container `id`.
    ///
    /// Returns false when the relocation was already claimed.
    pub fn claim_relocation(&self, id: NodeId) -> bool {
        let mut relocated = self.relocated.lock().unwrap_or_else(|e| e.into_inner());
        relocated.insert(id)
    }
}
