//! Router modules bound to a deployed warp route.

use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{ChainName, ChainRegistry, WarpRouteConfig};

/// A deployed warp route a router module operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedRoute {
    pub chain: ChainName,
    pub address: String,
    pub config: WarpRouteConfig,
}

/// A transaction submitted while applying a config update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTx {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub hash: String,
}

/// Applies config updates to a deployed route.
pub trait RouterModule: Send + Sync {
    /// Diff `config` against the deployed route and submit the needed transactions.
    fn update<'a>(
        &'a self,
        config: &'a WarpRouteConfig,
    ) -> impl Future<Output = Result<Vec<SubmittedTx>>> + Send + 'a;
}

/// Builds [`RouterModule`]s for deployed routes.
pub trait RouterModuleFactory: Send + Sync {
    type Signer: Send + Sync;
    type Module: RouterModule;

    fn connect(
        &self,
        chains: &ChainRegistry,
        signer: Self::Signer,
        route: DeployedRoute,
    ) -> Result<Self::Module>;
}
