//! Multi-chain warp route deployment.
//!
//! A run goes through three phases, each finishing for every chain before the
//! next one starts:
//!
//! 1. Preparation: every config is validated and a signer is resolved per chain.
//!    A single failure aborts the whole run before anything is deployed.
//! 2. Batch deployment: the deployer is called once with every config. Any error
//!    fails every chain, since partial results cannot be trusted.
//! 3. Enrollment: chains are enrolled one after the other with the routers of
//!    every other chain. The first failure stops the loop; chains not reached yet
//!    stay `deployed` so enrollment can be resumed later.

use std::{future::Future, time::Duration};

use anyhow::Context;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    ChainMap, ChainName, ChainRegistry, DeploymentSnapshot, DeploymentStatus,
    OrchestrationError, OrchestratorSettings, StatusTracker, WarpRouteConfig,
    error::SignerError,
    mesh::remote_routers_for,
    tracker::RunId,
    traits::{DeployedRoute, RouterModule, RouterModuleFactory, SignerResolver, SubmittedTx, WarpDeployer},
};

/// Outcome of a single-chain deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarpDeployResult {
    pub chain: ChainName,
    pub address: String,
    pub config: WarpRouteConfig,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub tx_hashes: Vec<String>,
}

/// Drives warp route deployments across chains.
pub struct WarpOrchestrator<R, D, F> {
    chains: ChainRegistry,
    resolver: R,
    deployer: D,
    routers: F,
    settings: OrchestratorSettings,
    tracker: StatusTracker,
}

impl<R, D, F> WarpOrchestrator<R, D, F>
where
    R: SignerResolver,
    D: WarpDeployer<Signer = R::Signer>,
    F: RouterModuleFactory<Signer = R::Signer>,
{
    pub fn new(
        chains: ChainRegistry,
        resolver: R,
        deployer: D,
        routers: F,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            chains,
            resolver,
            deployer,
            routers,
            settings,
            tracker: StatusTracker::new(),
        }
    }

    /// Handle to the per-chain status of the current run.
    pub fn tracker(&self) -> StatusTracker {
        self.tracker.clone()
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Deploy a warp route on every configured chain and enroll the full router mesh.
    pub async fn deploy(
        &self,
        configs: &ChainMap<WarpRouteConfig>,
        wallets: &ChainMap<R::Wallet>,
    ) -> Result<ChainMap<String>, OrchestrationError> {
        self.deploy_with_cancel(configs, wallets, CancellationToken::new())
            .await
    }

    /// Like [`Self::deploy`], stopping early once `cancel` fires.
    ///
    /// Cancellation during enrollment takes effect before the next chain, never
    /// in the middle of a router update.
    pub async fn deploy_with_cancel(
        &self,
        configs: &ChainMap<WarpRouteConfig>,
        wallets: &ChainMap<R::Wallet>,
        cancel: CancellationToken,
    ) -> Result<ChainMap<String>, OrchestrationError> {
        check_preconditions(configs, wallets)?;

        let chains: Vec<ChainName> = configs.keys().cloned().collect();
        tracing::info!(
            chains = ?chains,
            chain_count = chains.len(),
            "Starting multi-chain warp deployment"
        );

        let run = self.tracker.begin_run();

        let signers = self.prepare_all(run, configs, wallets, &cancel).await?;
        let addresses = self.deploy_batch(run, configs, &signers, &cancel).await?;
        drop(signers);

        self.enroll(run, configs, wallets, &addresses, &chains, &cancel)
            .await?;

        tracing::info!(
            chains = ?chains,
            addresses = ?addresses,
            "Multi-chain warp deployment complete"
        );

        Ok(addresses)
    }

    /// Deploy a warp route on a single chain. No routers are enrolled.
    pub async fn deploy_single(
        &self,
        chain: &str,
        config: &WarpRouteConfig,
        wallet: &R::Wallet,
    ) -> Result<WarpDeployResult, OrchestrationError> {
        tracing::info!(chain, token_type = %config.token.kind(), "Starting warp route deployment");

        let run = self.tracker.begin_run();
        let cancel = CancellationToken::new();

        let signer = self.prepare_chain(run, chain, config, wallet).await?;

        let configs = ChainMap::from([(chain.to_string(), config.clone())]);
        let signers = ChainMap::from([(chain.to_string(), signer)]);
        let addresses = self.deploy_batch(run, &configs, &signers, &cancel).await?;

        let address = addresses
            .get(chain)
            .cloned()
            .ok_or_else(|| OrchestrationError::MissingAddress {
                chain: chain.to_string(),
            })?;

        tracing::info!(chain, address = %address, "Warp route deployed successfully");

        Ok(WarpDeployResult {
            chain: chain.to_string(),
            address,
            config: config.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            tx_hashes: vec![],
        })
    }

    /// Re-enter enrollment for the chains of `prior` that are deployed but not
    /// enrolled, skipping preparation and deployment.
    ///
    /// Every chain in `configs` needs a deployed address in `prior`; chains
    /// already `complete` are left alone.
    pub async fn resume_enrollment(
        &self,
        configs: &ChainMap<WarpRouteConfig>,
        wallets: &ChainMap<R::Wallet>,
        prior: DeploymentSnapshot,
        cancel: CancellationToken,
    ) -> Result<ChainMap<String>, OrchestrationError> {
        check_preconditions(configs, wallets)?;

        let mut addresses = ChainMap::with_capacity(configs.len());
        for (chain, config) in configs {
            let address = prior.deployed_addresses.get(chain).ok_or_else(|| {
                OrchestrationError::MissingAddress {
                    chain: chain.clone(),
                }
            })?;
            config
                .validate()
                .map_err(|source| OrchestrationError::ConfigValidation {
                    chain: chain.clone(),
                    source,
                })?;
            addresses.insert(chain.clone(), address.clone());
        }

        let run = self.tracker.restore(prior);
        let snapshot = self.tracker.snapshot();
        let pending: Vec<ChainName> = configs
            .keys()
            .filter(|chain| snapshot.status(chain) == Some(DeploymentStatus::Deployed))
            .cloned()
            .collect();

        tracing::info!(
            pending = ?pending,
            chain_count = configs.len(),
            "Resuming remote router enrollment"
        );

        self.enroll(run, configs, wallets, &addresses, &pending, &cancel)
            .await?;

        Ok(addresses)
    }

    /// Apply `config` to the route already deployed at `address` on `chain`.
    pub async fn apply_update(
        &self,
        chain: &str,
        address: &str,
        config: &WarpRouteConfig,
        wallet: &R::Wallet,
    ) -> Result<Vec<SubmittedTx>, OrchestrationError> {
        config
            .validate_for_chain(chain)
            .map_err(|source| OrchestrationError::ConfigValidation {
                chain: chain.to_string(),
                source,
            })?;

        if address.trim().is_empty() {
            return Err(OrchestrationError::MissingAddress {
                chain: chain.to_string(),
            });
        }

        tracing::debug!(chain, address, "Applying warp config update");

        let txs = self
            .update_route(chain, address, config.clone(), wallet)
            .await
            .map_err(|source| {
                tracing::error!(chain, error = %source, "Failed to apply warp config update");
                OrchestrationError::Update {
                    chain: chain.to_string(),
                    source,
                }
            })?;

        tracing::info!(chain, tx_count = txs.len(), "Warp config update successful");
        Ok(txs)
    }

    async fn prepare_all(
        &self,
        run: RunId,
        configs: &ChainMap<WarpRouteConfig>,
        wallets: &ChainMap<R::Wallet>,
        cancel: &CancellationToken,
    ) -> Result<ChainMap<R::Signer>, OrchestrationError> {
        let preparation = futures::stream::iter(configs.iter())
            .map(move |(chain, config)| async move {
                let wallet =
                    wallets
                        .get(chain)
                        .ok_or_else(|| OrchestrationError::WalletMismatch {
                            missing: vec![chain.clone()],
                            unexpected: vec![],
                        })?;
                let signer = self.prepare_chain(run, chain, config, wallet).await?;
                Ok::<_, OrchestrationError>((chain.clone(), signer))
            })
            .buffered(self.settings.prepare_concurrency())
            .try_collect::<ChainMap<_>>();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(OrchestrationError::Cancelled),
            result = preparation => result,
        };

        result.inspect_err(|err| {
            let cause = match err.chain() {
                Some(failed) => format!("aborted: preparation failed on {failed}"),
                None => err.to_string(),
            };
            self.fail_unsettled(run, configs.keys(), &cause);
        })
    }

    /// Validate the config and resolve the signer of one chain.
    async fn prepare_chain(
        &self,
        run: RunId,
        chain: &str,
        config: &WarpRouteConfig,
        wallet: &R::Wallet,
    ) -> Result<R::Signer, OrchestrationError> {
        self.tracker
            .transition(run, chain, DeploymentStatus::Validating);

        let result = self.try_prepare_chain(chain, config, wallet).await;

        if let Err(err) = &result {
            tracing::error!(chain, error = %err, "Failed to prepare signer");
            self.tracker.fail(run, chain, err.to_string());
        }

        result
    }

    async fn try_prepare_chain(
        &self,
        chain: &str,
        config: &WarpRouteConfig,
        wallet: &R::Wallet,
    ) -> Result<R::Signer, OrchestrationError> {
        let invalid = |source| OrchestrationError::ConfigValidation {
            chain: chain.to_string(),
            source,
        };

        config.validate().map_err(invalid)?;
        let metadata = self.chains.get(chain).map_err(invalid)?;

        tracing::debug!(chain, protocol = %metadata.protocol, "Resolving signer");

        within(
            self.settings.signer_timeout(),
            "signer resolution",
            self.resolver.resolve(metadata, wallet),
        )
        .await
        .map_err(SignerError::Other)
        .and_then(|resolved| resolved)
        .map_err(|source| OrchestrationError::SignerResolution {
            chain: chain.to_string(),
            source,
        })
    }

    async fn deploy_batch(
        &self,
        run: RunId,
        configs: &ChainMap<WarpRouteConfig>,
        signers: &ChainMap<R::Signer>,
        cancel: &CancellationToken,
    ) -> Result<ChainMap<String>, OrchestrationError> {
        for chain in configs.keys() {
            self.tracker
                .transition(run, chain, DeploymentStatus::Deploying);
        }

        tracing::info!(
            chains = ?configs.keys().collect::<Vec<_>>(),
            "Deploying warp routes across all chains"
        );

        let deployment = within(
            self.settings.deploy_timeout(),
            "batch deployment",
            self.deployer.deploy(configs, signers),
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("Deployment cancelled during batch deployment");
                self.fail_unsettled(run, configs.keys(), "deployment cancelled");
                return Err(OrchestrationError::Cancelled);
            }
            result = deployment => result.and_then(|deployed| deployed),
        };

        // Only chains of this batch take part in the mesh.
        let result = result.and_then(|mut addresses| {
            let mut batch = ChainMap::with_capacity(configs.len());
            for chain in configs.keys() {
                let Some(address) = addresses.swap_remove(chain) else {
                    anyhow::bail!("deployer returned no address for {chain}");
                };
                batch.insert(chain.clone(), address);
            }
            if !addresses.is_empty() {
                tracing::warn!(
                    chains = ?addresses.keys().collect::<Vec<_>>(),
                    "Ignoring addresses returned for chains outside the batch"
                );
            }
            Ok(batch)
        });

        match result {
            Ok(addresses) => {
                self.tracker.record_addresses(run, &addresses);
                for chain in configs.keys() {
                    self.tracker
                        .transition(run, chain, DeploymentStatus::Deployed);
                }
                tracing::info!(addresses = ?addresses, "Warp routes deployed successfully");
                Ok(addresses)
            }
            Err(source) => {
                tracing::error!(error = %source, "Batch deployment failed");
                self.fail_unsettled(
                    run,
                    configs.keys(),
                    &format!("batch deployment failed: {source:#}"),
                );
                Err(OrchestrationError::BatchDeployment { source })
            }
        }
    }

    /// Enroll remote routers on `pending`, one chain at a time.
    async fn enroll(
        &self,
        run: RunId,
        configs: &ChainMap<WarpRouteConfig>,
        wallets: &ChainMap<R::Wallet>,
        addresses: &ChainMap<String>,
        pending: &[ChainName],
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        for chain in pending {
            if cancel.is_cancelled() {
                tracing::warn!(chain = %chain, "Deployment cancelled before enrollment");
                return Err(OrchestrationError::Cancelled);
            }

            self.tracker
                .transition(run, chain, DeploymentStatus::Enrolling);

            match self.enroll_chain(chain, configs, wallets, addresses).await {
                Ok(txs) => {
                    tracing::info!(chain = %chain, tx_count = txs.len(), "Remote routers enrolled successfully");
                    self.tracker
                        .complete(run, chain, txs.into_iter().map(|tx| tx.hash).collect());
                }
                Err(source) => {
                    tracing::error!(chain = %chain, error = %source, "Failed to enroll remote routers");
                    self.tracker.fail(run, chain, format!("{source:#}"));
                    return Err(OrchestrationError::Enrollment {
                        chain: chain.clone(),
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    async fn enroll_chain(
        &self,
        chain: &str,
        configs: &ChainMap<WarpRouteConfig>,
        wallets: &ChainMap<R::Wallet>,
        addresses: &ChainMap<String>,
    ) -> anyhow::Result<Vec<SubmittedTx>> {
        let config = configs
            .get(chain)
            .with_context(|| format!("no warp route config for {chain}"))?;
        let wallet = wallets
            .get(chain)
            .with_context(|| format!("no wallet for {chain}"))?;
        let address = addresses
            .get(chain)
            .with_context(|| format!("no deployed address for {chain}"))?;

        let updated = config.with_remote_routers(remote_routers_for(chain, addresses));

        tracing::debug!(
            chain,
            remote_routers = ?updated
                .remote_routers
                .as_ref()
                .map(|routers| routers.keys().collect::<Vec<_>>()),
            "Enrolling remote routers"
        );

        self.update_route(chain, address, updated, wallet).await
    }

    /// Resolve a fresh signer and apply `config` through a router module.
    async fn update_route(
        &self,
        chain: &str,
        address: &str,
        config: WarpRouteConfig,
        wallet: &R::Wallet,
    ) -> anyhow::Result<Vec<SubmittedTx>> {
        let metadata = self.chains.get(chain)?;
        let signer = within(
            self.settings.signer_timeout(),
            "signer resolution",
            self.resolver.resolve(metadata, wallet),
        )
        .await??;

        let module = self.routers.connect(
            &self.chains,
            signer,
            DeployedRoute {
                chain: chain.to_string(),
                address: address.to_string(),
                config: config.clone(),
            },
        )?;

        within(
            self.settings.enrollment_timeout(),
            "router update",
            module.update(&config),
        )
        .await?
    }

    /// Fail every chain of `chains` that has not reached a terminal state.
    fn fail_unsettled<'c>(
        &self,
        run: RunId,
        chains: impl Iterator<Item = &'c ChainName>,
        cause: &str,
    ) {
        for chain in chains {
            let settled = self
                .tracker
                .status(chain)
                .is_some_and(|status| status.is_terminal());
            if !settled {
                self.tracker.fail(run, chain, cause);
            }
        }
    }
}

fn check_preconditions<W>(
    configs: &ChainMap<WarpRouteConfig>,
    wallets: &ChainMap<W>,
) -> Result<(), OrchestrationError> {
    if configs.is_empty() {
        tracing::error!("No chains provided for multi-chain deployment");
        return Err(OrchestrationError::NoChains);
    }

    let missing: Vec<ChainName> = configs
        .keys()
        .filter(|chain| !wallets.contains_key(*chain))
        .cloned()
        .collect();
    let unexpected: Vec<ChainName> = wallets
        .keys()
        .filter(|chain| !configs.contains_key(*chain))
        .cloned()
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(OrchestrationError::WalletMismatch {
            missing,
            unexpected,
        });
    }

    Ok(())
}

/// Await `fut`, failing once `limit` elapses.
async fn within<T>(
    limit: Option<Duration>,
    what: &str,
    fut: impl Future<Output = T>,
) -> anyhow::Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| anyhow::anyhow!("{what} timed out after {}s", limit.as_secs())),
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenType;

    fn config() -> WarpRouteConfig {
        WarpRouteConfig::new(TokenType::Native, "owner", "mailbox")
    }

    #[test]
    fn test_preconditions() {
        let empty: ChainMap<WarpRouteConfig> = ChainMap::new();
        let no_wallets: ChainMap<String> = ChainMap::new();
        assert!(matches!(
            check_preconditions(&empty, &no_wallets),
            Err(OrchestrationError::NoChains)
        ));

        let configs = ChainMap::from([
            ("alpha".to_string(), config()),
            ("beta".to_string(), config()),
        ]);
        let wallets = ChainMap::from([
            ("alpha".to_string(), "w".to_string()),
            ("gamma".to_string(), "w".to_string()),
        ]);
        match check_preconditions(&configs, &wallets) {
            Err(OrchestrationError::WalletMismatch {
                missing,
                unexpected,
            }) => {
                assert_eq!(missing, vec!["beta".to_string()]);
                assert_eq!(unexpected, vec!["gamma".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let wallets = ChainMap::from([
            ("beta".to_string(), "w".to_string()),
            ("alpha".to_string(), "w".to_string()),
        ]);
        assert!(check_preconditions(&configs, &wallets).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_within_times_out() {
        let result = within(Some(Duration::from_secs(5)), "router update", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "router update timed out after 5s");
    }

    #[tokio::test]
    async fn test_within_without_limit() {
        let value = within(None, "noop", async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }
}
