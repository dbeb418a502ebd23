//! Signer resolution.

use std::future::Future;

use crate::{ChainMetadata, error::SignerError};

/// Produces a protocol-appropriate signing capability from a wallet handle.
pub trait SignerResolver: Send + Sync {
    /// Wallet handle supplied by the caller for a chain.
    type Wallet: Send + Sync;

    /// Signing capability used to deploy and update routes.
    type Signer: Send + Sync;

    /// Resolve the signer for the chain described by `metadata`.
    ///
    /// Fails with [`SignerError::WalletNotConnected`] when the wallet is unusable
    /// for the chain's protocol family.
    fn resolve<'a>(
        &'a self,
        metadata: &'a ChainMetadata,
        wallet: &'a Self::Wallet,
    ) -> impl Future<Output = Result<Self::Signer, SignerError>> + Send + 'a;
}
