//! Per-chain status tracking.
//!
//! The orchestrator is the only writer. Observers read snapshots or subscribe to
//! the underlying watch channel to be notified of every change.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{ChainMap, ChainStatus, DeploymentStatus};

/// Identifies the deployment run allowed to write to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunId(u64);

/// Point-in-time view of a deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentSnapshot {
    pub statuses: ChainMap<ChainStatus>,
    pub deployed_addresses: ChainMap<String>,
    #[serde(skip)]
    generation: u64,
}

impl PartialEq for DeploymentSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.statuses == other.statuses && self.deployed_addresses == other.deployed_addresses
    }
}

impl Eq for DeploymentSnapshot {}

impl DeploymentSnapshot {
    pub fn new(statuses: ChainMap<ChainStatus>, deployed_addresses: ChainMap<String>) -> Self {
        Self {
            statuses,
            deployed_addresses,
            generation: 0,
        }
    }

    pub fn status(&self, chain: &str) -> Option<DeploymentStatus> {
        self.statuses.get(chain).map(|entry| entry.status)
    }

    pub fn is_deploying(&self) -> bool {
        self.statuses
            .values()
            .any(|entry| entry.status.is_in_flight())
    }

    /// Chains currently in `status`, in tracking order.
    pub fn chains_in(&self, status: DeploymentStatus) -> Vec<String> {
        self.statuses
            .iter()
            .filter(|(_, entry)| entry.status == status)
            .map(|(chain, _)| chain.clone())
            .collect()
    }
}

/// Shared handle to the status of the current deployment run.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    sender: Arc<watch::Sender<DeploymentSnapshot>>,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(DeploymentSnapshot::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<DeploymentSnapshot> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> DeploymentSnapshot {
        self.sender.borrow().clone()
    }

    pub fn status(&self, chain: &str) -> Option<DeploymentStatus> {
        self.sender.borrow().status(chain)
    }

    pub fn deployed_addresses(&self) -> ChainMap<String> {
        self.sender.borrow().deployed_addresses.clone()
    }

    pub fn is_deploying(&self) -> bool {
        self.sender.borrow().is_deploying()
    }

    /// Clear all statuses and addresses.
    ///
    /// Writes from runs started before the reset are ignored afterwards.
    pub fn reset(&self) {
        self.sender.send_modify(|snapshot| {
            *snapshot = DeploymentSnapshot {
                generation: snapshot.generation + 1,
                ..Default::default()
            };
        });
        tracing::debug!("Deployment status reset");
    }

    /// Start a fresh run, clearing any previous state.
    pub(crate) fn begin_run(&self) -> RunId {
        let mut run = RunId(0);
        self.sender.send_modify(|snapshot| {
            run = RunId(snapshot.generation + 1);
            *snapshot = DeploymentSnapshot {
                generation: run.0,
                ..Default::default()
            };
        });
        run
    }

    /// Start a run seeded from a previously persisted snapshot.
    ///
    /// Chains with a recorded address that were `failed` or `enrolling` only
    /// lack enrollment and are put back to `deployed`, as are addresses with
    /// no recorded status.
    pub(crate) fn restore(&self, prior: DeploymentSnapshot) -> RunId {
        let mut run = RunId(0);
        self.sender.send_modify(|snapshot| {
            run = RunId(snapshot.generation + 1);

            let mut restored = prior;
            restored.generation = run.0;
            for chain in restored.deployed_addresses.keys() {
                let entry = restored
                    .statuses
                    .entry(chain.clone())
                    .or_insert_with(|| ChainStatus::new(DeploymentStatus::Deployed));
                let resumable = matches!(
                    entry.status,
                    DeploymentStatus::Failed | DeploymentStatus::Enrolling
                );
                if resumable {
                    *entry = ChainStatus::new(DeploymentStatus::Deployed);
                }
            }

            *snapshot = restored;
        });
        run
    }

    /// Move `chain` to `next`. Illegal transitions and stale runs are ignored.
    pub(crate) fn transition(&self, run: RunId, chain: &str, next: DeploymentStatus) -> bool {
        self.update(run, chain, next, |entry| {
            entry.status = next;
            entry.error = None;
        })
    }

    /// Mark `chain` as failed with a human readable cause.
    pub(crate) fn fail(&self, run: RunId, chain: &str, cause: impl Into<String>) -> bool {
        let mut cause = cause.into();
        if cause.trim().is_empty() {
            cause = "unknown error".to_string();
        }

        self.update(run, chain, DeploymentStatus::Failed, |entry| {
            entry.status = DeploymentStatus::Failed;
            entry.error = Some(cause);
        })
    }

    /// Mark `chain` as complete, keeping the submitted transaction hashes.
    pub(crate) fn complete(&self, run: RunId, chain: &str, tx_hashes: Vec<String>) -> bool {
        self.update(run, chain, DeploymentStatus::Complete, |entry| {
            entry.status = DeploymentStatus::Complete;
            entry.error = None;
            entry.tx_hashes = tx_hashes;
        })
    }

    pub(crate) fn record_addresses(&self, run: RunId, addresses: &ChainMap<String>) {
        self.sender.send_if_modified(|snapshot| {
            if snapshot.generation != run.0 {
                return false;
            }
            snapshot.deployed_addresses = addresses.clone();
            true
        });
    }

    fn update(
        &self,
        run: RunId,
        chain: &str,
        next: DeploymentStatus,
        apply: impl FnOnce(&mut ChainStatus),
    ) -> bool {
        self.sender.send_if_modified(|snapshot| {
            if snapshot.generation != run.0 {
                tracing::debug!(chain, %next, "Ignoring status update from a stale run");
                return false;
            }

            let current = snapshot.status(chain).unwrap_or_default();
            if !current.can_transition_to(next) {
                tracing::warn!(chain, from = %current, to = %next, "Rejected illegal status transition");
                return false;
            }

            apply(snapshot.statuses.entry(chain.to_string()).or_default());
            true
        })
    }
}
