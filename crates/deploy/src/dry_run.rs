//! In-memory collaborators for rehearsing deployments without a network.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    ChainMap, ChainMetadata, ChainName, ChainRegistry, ProtocolType, WarpRouteConfig,
    address::address_from_digest,
    error::SignerError,
    traits::{
        DeployedRoute, RouterModule, RouterModuleFactory, SignerResolver, SubmittedTx,
        WarpDeployer,
    },
};

/// Failures injected into a dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DryRunFaults {
    /// Chains whose wallet is reported as not connected.
    pub unusable_wallets: Vec<ChainName>,
    /// When set, the batch deployment fails with this message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_failure: Option<String>,
    /// Enrollment failure message per chain.
    pub enrollment_failures: ChainMap<String>,
}

/// Signing capability handed out by the dry-run resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunSigner {
    pub chain: ChainName,
    pub protocol: ProtocolType,
    pub account: String,
}

/// A router update applied by the dry-run backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEnrollment {
    pub chain: ChainName,
    pub address: String,
    pub account: String,
    pub config: WarpRouteConfig,
}

#[derive(Debug, Default)]
struct DryRunState {
    deployments: u64,
    enrollments: Vec<RecordedEnrollment>,
}

/// Signer resolver, deployer and router module factory in one.
///
/// Wallets are plain account strings. Clones share recorded state.
#[derive(Debug, Clone, Default)]
pub struct DryRunBackend {
    faults: Arc<DryRunFaults>,
    latency: Option<Duration>,
    state: Arc<Mutex<DryRunState>>,
}

impl DryRunBackend {
    pub fn new(faults: DryRunFaults) -> Self {
        Self {
            faults: Arc::new(faults),
            ..Default::default()
        }
    }

    /// Delay every deployment and router update by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn faults(&self) -> &DryRunFaults {
        &self.faults
    }

    /// Router updates applied so far, in submission order.
    pub fn enrollments(&self) -> Vec<RecordedEnrollment> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enrollments
            .clone()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn next_deployment_nonce(&self) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.deployments += 1;
        state.deployments
    }
}

impl SignerResolver for DryRunBackend {
    type Wallet = String;
    type Signer = DryRunSigner;

    fn resolve<'a>(
        &'a self,
        metadata: &'a ChainMetadata,
        wallet: &'a String,
    ) -> impl Future<Output = Result<DryRunSigner, SignerError>> + Send + 'a {
        async move {
            if !metadata.protocol.supports_deployment() {
                return Err(SignerError::UnsupportedProtocol {
                    chain: metadata.name.clone(),
                    protocol: metadata.protocol,
                });
            }

            let unusable = self.faults.unusable_wallets.contains(&metadata.name);
            if wallet.trim().is_empty() || unusable {
                return Err(SignerError::WalletNotConnected {
                    chain: metadata.name.clone(),
                    protocol: metadata.protocol,
                });
            }

            Ok(DryRunSigner {
                chain: metadata.name.clone(),
                protocol: metadata.protocol,
                account: wallet.clone(),
            })
        }
    }
}

impl WarpDeployer for DryRunBackend {
    type Signer = DryRunSigner;

    fn deploy<'a>(
        &'a self,
        configs: &'a ChainMap<WarpRouteConfig>,
        signers: &'a ChainMap<DryRunSigner>,
    ) -> impl Future<Output = Result<ChainMap<String>>> + Send + 'a {
        async move {
            self.simulate_latency().await;

            if let Some(message) = &self.faults.deploy_failure {
                bail!("{message}");
            }

            let nonce = self.next_deployment_nonce();
            let mut addresses = ChainMap::with_capacity(configs.len());

            for (chain, config) in configs {
                if !signers.contains_key(chain) {
                    bail!("no signer for {chain}");
                }

                let mut hasher = Sha256::new();
                hasher.update(format!("{chain}:{}:{nonce}", config.owner).as_bytes());
                let address = address_from_digest(&hasher.finalize());

                tracing::debug!(chain = %chain, address = %address, "Dry-run route deployed");
                addresses.insert(chain.clone(), address);
            }

            Ok(addresses)
        }
    }
}

impl RouterModuleFactory for DryRunBackend {
    type Signer = DryRunSigner;
    type Module = DryRunRouter;

    fn connect(
        &self,
        chains: &ChainRegistry,
        signer: DryRunSigner,
        route: DeployedRoute,
    ) -> Result<DryRunRouter> {
        if chains.try_get(&route.chain).is_none() {
            bail!("chain metadata not found for {}", route.chain);
        }

        Ok(DryRunRouter {
            backend: self.clone(),
            signer,
            route,
        })
    }
}

/// Router module of a dry-run route.
#[derive(Debug)]
pub struct DryRunRouter {
    backend: DryRunBackend,
    signer: DryRunSigner,
    route: DeployedRoute,
}

impl RouterModule for DryRunRouter {
    fn update<'a>(
        &'a self,
        config: &'a WarpRouteConfig,
    ) -> impl Future<Output = Result<Vec<SubmittedTx>>> + Send + 'a {
        async move {
            self.backend.simulate_latency().await;

            let chain = &self.route.chain;
            if let Some(message) = self.backend.faults.enrollment_failures.get(chain) {
                bail!("{message}");
            }

            let mut state = self
                .backend
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.enrollments.push(RecordedEnrollment {
                chain: chain.clone(),
                address: self.route.address.clone(),
                account: self.signer.account.clone(),
                config: config.clone(),
            });

            let mut hasher = Sha256::new();
            hasher.update(
                format!("{chain}:{}:{}", self.route.address, state.enrollments.len()).as_bytes(),
            );
            let hash = format!("0x{}", hex::encode(hasher.finalize()));

            let routers = config
                .remote_routers
                .as_ref()
                .map(|routers| routers.len())
                .unwrap_or_default();

            Ok(vec![SubmittedTx {
                annotation: Some(format!("Enroll {routers} remote routers")),
                hash,
            }])
        }
    }
}
