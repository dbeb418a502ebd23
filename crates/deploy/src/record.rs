//! Persisted deployment history.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{ChainMap, ChainName, DeploymentSnapshot, TokenKind, WarpRouteConfig};

/// Default file name of a saved deployment state.
pub const DEPLOYMENT_STATE_FILENAME: &str = "deployment-state.json";

/// A deployed warp route, as kept in the deployment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpDeploymentRecord {
    pub id: String,
    pub chain_name: ChainName,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub address: String,
    pub config: WarpRouteConfig,
    pub token_type: TokenKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tx_hashes: Vec<String>,
}

impl WarpDeploymentRecord {
    pub fn new(
        chain_name: impl Into<ChainName>,
        address: impl Into<String>,
        config: WarpRouteConfig,
        timestamp: i64,
        tx_hashes: Vec<String>,
    ) -> Self {
        let chain_name = chain_name.into();
        let address = address.into();

        Self {
            id: record_id(&chain_name, &address, timestamp),
            token_type: config.token.kind(),
            chain_name,
            timestamp,
            address,
            config,
            tx_hashes,
        }
    }
}

/// Short identifier of a record: the first 16 hex digits of
/// `sha256("{chain}:{address}:{timestamp}")`.
pub fn record_id(chain: &str, address: &str, timestamp: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{chain}:{address}:{timestamp}").as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(16);
    id
}

/// Build one record per configured chain with a deployed address.
pub fn records_from_snapshot(
    configs: &ChainMap<WarpRouteConfig>,
    snapshot: &DeploymentSnapshot,
    timestamp: i64,
) -> Vec<WarpDeploymentRecord> {
    configs
        .iter()
        .filter_map(|(chain, config)| {
            let address = snapshot.deployed_addresses.get(chain)?;
            let tx_hashes = snapshot
                .statuses
                .get(chain)
                .map(|entry| entry.tx_hashes.clone())
                .unwrap_or_default();
            Some(WarpDeploymentRecord::new(
                chain.clone(),
                address.clone(),
                config.clone(),
                timestamp,
                tx_hashes,
            ))
        })
        .collect()
}

/// Everything needed to inspect a deployment or resume its enrollment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub snapshot: DeploymentSnapshot,
    #[serde(default)]
    pub records: Vec<WarpDeploymentRecord>,
}

impl DeploymentState {
    /// Save the state as formatted JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment state")?;

        std::fs::write(path, json).context(format!(
            "Failed to write deployment state to {}",
            path.display()
        ))?;

        tracing::info!(path = %path.display(), "Deployment state saved");
        Ok(())
    }

    /// Load a state previously written by [`Self::save_to_file`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Deployment state file does not exist: {}", path.display());
        }

        let content = std::fs::read_to_string(path).context(format!(
            "Failed to read deployment state from {}",
            path.display()
        ))?;

        let state: Self = serde_json::from_str(&content).context(format!(
            "Failed to parse deployment state from {}",
            path.display()
        ))?;

        tracing::debug!(
            path = %path.display(),
            chains = state.snapshot.statuses.len(),
            "Deployment state loaded"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChainStatus, DeploymentStatus, TokenType};
    use tempdir::TempDir;

    fn config() -> WarpRouteConfig {
        WarpRouteConfig::new(
            TokenType::Synthetic {
                name: Some("Token".to_string()),
                symbol: Some("TKN".to_string()),
                decimals: Some(6),
            },
            "owner",
            "mailbox",
        )
    }

    fn snapshot() -> DeploymentSnapshot {
        DeploymentSnapshot::new(
            ChainMap::from([
                (
                    "alpha".to_string(),
                    ChainStatus {
                        status: DeploymentStatus::Complete,
                        error: None,
                        tx_hashes: vec!["0xaa".to_string()],
                    },
                ),
                ("beta".to_string(), ChainStatus::new(DeploymentStatus::Deployed)),
                (
                    "gamma".to_string(),
                    ChainStatus {
                        status: DeploymentStatus::Failed,
                        error: Some("boom".to_string()),
                        tx_hashes: vec![],
                    },
                ),
            ]),
            ChainMap::from([
                ("alpha".to_string(), "0xA".to_string()),
                ("beta".to_string(), "0xB".to_string()),
            ]),
        )
    }

    #[test]
    fn test_record_id_is_deterministic() {
        let id = record_id("alpha", "0xA", 1_700_000_000_000);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, record_id("alpha", "0xA", 1_700_000_000_000));
        assert_ne!(id, record_id("alpha", "0xA", 1_700_000_000_001));
    }

    #[test]
    fn test_records_only_for_deployed_chains() {
        let configs = ChainMap::from([
            ("alpha".to_string(), config()),
            ("beta".to_string(), config()),
            ("gamma".to_string(), config()),
        ]);

        let records = records_from_snapshot(&configs, &snapshot(), 42);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chain_name, "alpha");
        assert_eq!(records[0].tx_hashes, vec!["0xaa".to_string()]);
        assert_eq!(records[0].token_type, TokenKind::Synthetic);
        assert_eq!(records[1].chain_name, "beta");
        assert!(records[1].tx_hashes.is_empty());
    }

    #[test]
    fn test_state_save_and_load() {
        let temp_dir = TempDir::new("warpcake-record-test").unwrap();
        let path = temp_dir.path().join(DEPLOYMENT_STATE_FILENAME);

        let configs = ChainMap::from([("alpha".to_string(), config())]);
        let state = DeploymentState {
            records: records_from_snapshot(&configs, &snapshot(), 42),
            snapshot: snapshot(),
        };
        state.save_to_file(&path).unwrap();

        let loaded = DeploymentState::load_from_file(&path).unwrap();
        assert_eq!(state, loaded);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"chainName\": \"alpha\""));
        assert!(raw.contains("\"status\": \"complete\""));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new("warpcake-record-test").unwrap();
        let result = DeploymentState::load_from_file(&temp_dir.path().join("missing.json"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("does not exist")
        );
    }
}
