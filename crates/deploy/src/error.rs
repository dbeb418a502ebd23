//! Error taxonomy for warp route deployments.
//!
//! Collaborator failures stay opaque (`anyhow::Error`); the variants below only
//! say which phase failed and on which chain.

use thiserror::Error;

use crate::{ChainName, ProtocolType};

/// A warp route configuration failed its structural checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("decimals must be between 0 and {max}, got {decimals}")]
    InvalidDecimals { decimals: u8, max: u8 },

    #[error("remote router address for {chain} is required")]
    EmptyRemoteRouter { chain: ChainName },

    #[error("remote routers of {chain} must not reference the chain itself")]
    SelfRemoteRouter { chain: ChainName },

    #[error("destination gas for {chain} must be a non-negative integer, got {value:?}")]
    InvalidDestinationGas { chain: ChainName, value: String },

    #[error("chain metadata not found for {chain}")]
    ChainMetadataNotFound { chain: ChainName },

    #[error("no route configured for {chain}")]
    RouteNotConfigured { chain: ChainName },
}

/// The signer resolver could not produce a signing capability.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("{protocol} wallet not connected for {chain}")]
    WalletNotConnected {
        chain: ChainName,
        protocol: ProtocolType,
    },

    #[error("unsupported protocol for deployment on {chain}: {protocol}")]
    UnsupportedProtocol {
        chain: ChainName,
        protocol: ProtocolType,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a deployment run, tagged with the phase it happened in.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("no chains provided for warp route deployment")]
    NoChains,

    #[error("wallets do not match configured chains (missing: {missing:?}, unexpected: {unexpected:?})")]
    WalletMismatch {
        missing: Vec<ChainName>,
        unexpected: Vec<ChainName>,
    },

    #[error("invalid warp route config for {chain}: {source}")]
    ConfigValidation {
        chain: ChainName,
        #[source]
        source: ConfigValidationError,
    },

    #[error("failed to prepare signer for {chain}: {source}")]
    SignerResolution {
        chain: ChainName,
        #[source]
        source: SignerError,
    },

    #[error("batch deployment failed: {source}")]
    BatchDeployment {
        #[source]
        source: anyhow::Error,
    },

    #[error("router enrollment failed on {chain}: {source}")]
    Enrollment {
        chain: ChainName,
        #[source]
        source: anyhow::Error,
    },

    #[error("no deployed address recorded for {chain}")]
    MissingAddress { chain: ChainName },

    #[error("warp route update failed on {chain}: {source}")]
    Update {
        chain: ChainName,
        #[source]
        source: anyhow::Error,
    },

    #[error("deployment cancelled")]
    Cancelled,
}

impl OrchestrationError {
    /// The chain the error is attributed to, if it is chain scoped.
    pub fn chain(&self) -> Option<&str> {
        match self {
            Self::ConfigValidation { chain, .. }
            | Self::SignerResolution { chain, .. }
            | Self::Enrollment { chain, .. }
            | Self::MissingAddress { chain }
            | Self::Update { chain, .. } => Some(chain),
            Self::NoChains
            | Self::WalletMismatch { .. }
            | Self::BatchDeployment { .. }
            | Self::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrollment_error_names_chain_and_cause() {
        let err = OrchestrationError::Enrollment {
            chain: "beta".to_string(),
            source: anyhow::anyhow!("insufficient gas"),
        };

        let message = err.to_string();
        assert!(message.contains("beta"));
        assert!(message.contains("insufficient gas"));
        assert_eq!(err.chain(), Some("beta"));
    }

    #[test]
    fn test_batch_error_is_not_chain_scoped() {
        let err = OrchestrationError::BatchDeployment {
            source: anyhow::anyhow!("rpc unavailable"),
        };
        assert!(err.chain().is_none());
    }
}
