//! Deployment plan files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    ChainMap, ChainMetadata, ChainRegistry, DryRunFaults, OrchestrationError,
    OrchestratorSettings, WarpRouteConfig, error::ConfigValidationError,
};

/// The default name for the deployment plan file.
pub const WARP_PLAN_FILENAME: &str = "Warpcake.toml";

/// Everything needed to run a warp route deployment.
///
/// Stored as TOML. Routes and wallets are keyed by chain and must cover the
/// same chains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Directory deployment state is written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdata: Option<PathBuf>,

    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
    /// Metadata of every chain routes may be deployed on.
    #[serde(default)]
    pub chains: ChainMap<ChainMetadata>,
    /// Route config per chain, in deployment order.
    #[serde(default)]
    pub routes: ChainMap<WarpRouteConfig>,
    /// Wallet account per chain.
    #[serde(default)]
    pub wallets: ChainMap<String>,
    /// Failures injected when rehearsing the plan.
    #[serde(default)]
    pub dry_run: DryRunFaults,
}

impl DeploymentPlan {
    /// Save the plan to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deployment plan to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write plan to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Deployment plan saved");
        Ok(())
    }

    /// Load a plan from a TOML file, or from `Warpcake.toml` inside a directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Plan file or directory not found: {}",
                path.display()
            ));
        }

        let plan_path = if path.is_dir() {
            path.join(WARP_PLAN_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&plan_path)
            .context(format!("Failed to read plan from {}", plan_path.display()))?;
        let plan: Self =
            toml::from_str(&content).context("Failed to parse plan file as TOML")?;
        tracing::info!(
            path = %plan_path.display(),
            routes = plan.routes.len(),
            "Deployment plan loaded"
        );
        Ok(plan)
    }

    pub fn registry(&self) -> ChainRegistry {
        ChainRegistry::new(self.chains.clone())
    }

    /// Route configs with EVM-shaped addresses checksummed.
    pub fn normalized_routes(&self) -> ChainMap<WarpRouteConfig> {
        self.routes
            .iter()
            .map(|(chain, config)| (chain.clone(), config.normalize_addresses()))
            .collect()
    }

    /// Check the plan without touching any chain.
    ///
    /// Every route must be valid, reference a known chain and have a wallet.
    pub fn validate(&self) -> Result<(), OrchestrationError> {
        if self.routes.is_empty() {
            return Err(OrchestrationError::NoChains);
        }

        let registry = self.registry();
        for (chain, config) in &self.routes {
            let invalid = |source| OrchestrationError::ConfigValidation {
                chain: chain.clone(),
                source,
            };

            config.validate().map_err(invalid)?;
            registry.get(chain).map_err(invalid)?;
        }

        let missing: Vec<_> = self
            .routes
            .keys()
            .filter(|chain| !self.wallets.contains_key(*chain))
            .cloned()
            .collect();
        let unexpected: Vec<_> = self
            .wallets
            .keys()
            .filter(|chain| !self.routes.contains_key(*chain))
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

    /// The route config of `chain`.
    pub fn route(&self, chain: &str) -> Result<&WarpRouteConfig, OrchestrationError> {
        self.routes
            .get(chain)
            .ok_or_else(|| OrchestrationError::ConfigValidation {
                chain: chain.to_string(),
                source: ConfigValidationError::RouteNotConfigured {
                    chain: chain.to_string(),
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProtocolType, TokenType};
    use tempdir::TempDir;

    const PLAN: &str = r#"
outdata = "out"

[orchestrator]
prepare_concurrency = 2

[chains.alpha]
protocol = "cosmosnative"
domain_id = 1

[chains.beta]
protocol = "radix"
domain_id = 2
rpc_urls = ["http://localhost:26657"]

[routes.alpha]
type = "collateral"
token = "uatom"
owner = "owner-a"
mailbox = "mailbox-a"

[routes.beta]
type = "synthetic"
owner = "owner-b"
mailbox = "mailbox-b"
decimals = 6

[wallets]
alpha = "acct-a"
beta = "acct-b"

[dry_run]
enrollment_failures = { beta = "insufficient gas" }
"#;

    #[test]
    fn test_parse_plan() {
        let plan: DeploymentPlan = toml::from_str(PLAN).unwrap();

        assert_eq!(plan.outdata, Some(PathBuf::from("out")));
        assert_eq!(plan.orchestrator.prepare_concurrency, 2);
        assert_eq!(plan.chains["beta"].protocol, ProtocolType::Radix);
        assert_eq!(plan.routes.keys().collect::<Vec<_>>(), vec!["alpha", "beta"]);
        assert_eq!(
            plan.routes["alpha"].token,
            TokenType::Collateral {
                token: "uatom".to_string()
            }
        );
        assert_eq!(
            plan.dry_run.enrollment_failures["beta"],
            "insufficient gas"
        );
        assert_eq!(plan.registry().try_get("alpha").unwrap().name, "alpha");
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_through_directory() {
        let temp_dir = TempDir::new("warpcake-plan-test").unwrap();
        let plan: DeploymentPlan = toml::from_str(PLAN).unwrap();

        plan.save_to_file(&temp_dir.path().join(WARP_PLAN_FILENAME))
            .unwrap();
        let loaded = DeploymentPlan::load_from_file(temp_dir.path()).unwrap();

        assert_eq!(plan, loaded);
    }

    #[test]
    fn test_load_missing_plan() {
        let temp_dir = TempDir::new("warpcake-plan-test").unwrap();
        let err = DeploymentPlan::load_from_file(&temp_dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_validate_reports_unknown_chain_and_wallets() {
        let mut plan: DeploymentPlan = toml::from_str(PLAN).unwrap();
        plan.chains.shift_remove("beta");
        assert!(matches!(
            plan.validate(),
            Err(OrchestrationError::ConfigValidation {
                source: ConfigValidationError::ChainMetadataNotFound { .. },
                ..
            })
        ));

        let mut plan: DeploymentPlan = toml::from_str(PLAN).unwrap();
        plan.wallets.shift_remove("alpha");
        plan.wallets.insert("gamma".to_string(), "acct-g".to_string());
        match plan.validate() {
            Err(OrchestrationError::WalletMismatch {
                missing,
                unexpected,
            }) => {
                assert_eq!(missing, vec!["alpha".to_string()]);
                assert_eq!(unexpected, vec!["gamma".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(DeploymentPlan::default().validate().is_err());
    }

    #[test]
    fn test_route_of_unknown_chain() {
        let plan: DeploymentPlan = toml::from_str(PLAN).unwrap();
        assert_eq!(plan.route("alpha").unwrap().owner, "owner-a");

        let err = plan.route("gamma").unwrap_err();
        assert!(matches!(
            &err,
            OrchestrationError::ConfigValidation {
                source: ConfigValidationError::RouteNotConfigured { chain },
                ..
            } if chain == "gamma"
        ));
        assert!(err.to_string().contains("no route configured for gamma"));
    }
}
