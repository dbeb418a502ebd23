//! Batch deployment of warp routes.

use std::future::Future;

use anyhow::Result;

use crate::{ChainMap, WarpRouteConfig};

/// Deploys warp route contracts for a batch of chains.
///
/// Implementations may deploy chains in parallel or one after the other. A
/// failure may leave some chains deployed; callers treat any error as a failure
/// of the whole batch.
pub trait WarpDeployer: Send + Sync {
    type Signer: Send + Sync;

    /// Deploy every config and return the deployed route address per chain.
    fn deploy<'a>(
        &'a self,
        configs: &'a ChainMap<WarpRouteConfig>,
        signers: &'a ChainMap<Self::Signer>,
    ) -> impl Future<Output = Result<ChainMap<String>>> + Send + 'a;
}
