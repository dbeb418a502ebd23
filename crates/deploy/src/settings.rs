//! Orchestrator settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of chains prepared concurrently.
pub const DEFAULT_PREPARE_CONCURRENCY: usize = 4;

/// Default timeout for resolving a single signer.
pub const DEFAULT_SIGNER_TIMEOUT_SECS: u64 = 60;

/// Default timeout for the batch deployment call.
pub const DEFAULT_DEPLOY_TIMEOUT_SECS: u64 = 900;

/// Default timeout for a single router enrollment update.
pub const DEFAULT_ENROLLMENT_TIMEOUT_SECS: u64 = 300;

/// Tunables of the deployment orchestrator.
///
/// Timeouts set to `None` wait forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// How many chains are validated and have their signer resolved at once.
    pub prepare_concurrency: usize,
    pub signer_timeout_secs: Option<u64>,
    pub deploy_timeout_secs: Option<u64>,
    pub enrollment_timeout_secs: Option<u64>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            prepare_concurrency: DEFAULT_PREPARE_CONCURRENCY,
            signer_timeout_secs: Some(DEFAULT_SIGNER_TIMEOUT_SECS),
            deploy_timeout_secs: Some(DEFAULT_DEPLOY_TIMEOUT_SECS),
            enrollment_timeout_secs: Some(DEFAULT_ENROLLMENT_TIMEOUT_SECS),
        }
    }
}

impl OrchestratorSettings {
    pub fn prepare_concurrency(&self) -> usize {
        self.prepare_concurrency.max(1)
    }

    pub fn signer_timeout(&self) -> Option<Duration> {
        self.signer_timeout_secs.map(Duration::from_secs)
    }

    pub fn deploy_timeout(&self) -> Option<Duration> {
        self.deploy_timeout_secs.map(Duration::from_secs)
    }

    pub fn enrollment_timeout(&self) -> Option<Duration> {
        self.enrollment_timeout_secs.map(Duration::from_secs)
    }
}
