//! Chain metadata registry.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ChainMap, ChainName, error::ConfigValidationError};

/// Protocol family of a chain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProtocolType {
    Ethereum,
    CosmosNative,
    Radix,
    Aleo,
}

impl ProtocolType {
    /// Whether warp routes can be deployed on this protocol family.
    pub fn supports_deployment(&self) -> bool {
        matches!(
            self,
            ProtocolType::CosmosNative | ProtocolType::Radix | ProtocolType::Aleo
        )
    }
}

/// Metadata describing a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetadata {
    /// Chain name. Filled from the registry key when left empty.
    #[serde(default)]
    pub name: ChainName,
    pub protocol: ProtocolType,
    pub domain_id: u32,
    #[serde(default)]
    pub rpc_urls: Vec<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ChainMetadata {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Lookup of chain metadata by name or domain.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: ChainMap<ChainMetadata>,
}

impl ChainRegistry {
    pub fn new(chains: ChainMap<ChainMetadata>) -> Self {
        let chains = chains
            .into_iter()
            .map(|(name, mut metadata)| {
                if metadata.name.is_empty() {
                    metadata.name = name.clone();
                }
                (name, metadata)
            })
            .collect();

        Self { chains }
    }

    pub fn insert(&mut self, metadata: ChainMetadata) {
        self.chains.insert(metadata.name.clone(), metadata);
    }

    pub fn try_get(&self, chain: &str) -> Option<&ChainMetadata> {
        self.chains.get(chain)
    }

    /// Like [`Self::try_get`], failing with a validation error for unknown chains.
    pub fn get(&self, chain: &str) -> Result<&ChainMetadata, ConfigValidationError> {
        self.try_get(chain)
            .ok_or_else(|| ConfigValidationError::ChainMetadataNotFound {
                chain: chain.to_string(),
            })
    }

    pub fn domain_id(&self, chain: &str) -> Option<u32> {
        self.try_get(chain).map(|metadata| metadata.domain_id)
    }

    pub fn chain_name(&self, domain_id: u32) -> Option<&str> {
        self.chains
            .values()
            .find(|metadata| metadata.domain_id == domain_id)
            .map(|metadata| metadata.name.as_str())
    }

    pub fn known_chains(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    pub fn is_deployable(&self, chain: &str) -> bool {
        self.try_get(chain)
            .is_some_and(|metadata| metadata.protocol.supports_deployment())
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
