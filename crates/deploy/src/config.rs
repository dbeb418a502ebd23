//! Warp route configuration.
//!
//! The serialized shape follows the usual warp config layout: the token kind is
//! carried by a `type` field next to the shared fields.

use derive_more::{Deref, DerefMut, From};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{address::normalize_address, error::ConfigValidationError};

/// Opaque chain identifier, unique within a deployment batch.
pub type ChainName = String;

/// Insertion-ordered map keyed by chain.
pub type ChainMap<V> = IndexMap<ChainName, V>;

/// Largest decimal count accepted for synthetic tokens.
pub const MAX_SYNTHETIC_DECIMALS: u8 = 18;

/// Reference to a security module or hook: either a deployed address or an
/// inline policy that the deployer interprets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleReference {
    Address(String),
    Inline(serde_json::Value),
}

/// A router enrolled on a remote chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRouter {
    pub address: String,
}

/// Remote routers keyed by the chain they live on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, DerefMut, From)]
#[serde(transparent)]
pub struct RemoteRouters(pub ChainMap<RemoteRouter>);

/// Gas amounts (decimal strings) keyed by destination chain.
pub type DestinationGas = ChainMap<String>;

/// The kind of token a warp route bridges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenType {
    /// Wraps an existing fungible asset.
    Collateral { token: String },
    /// Mints a new representation of the asset.
    Synthetic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decimals: Option<u8>,
    },
    /// Wraps the chain's native asset.
    Native,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TokenKind {
    Collateral,
    Synthetic,
    Native,
}

impl TokenType {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenType::Collateral { .. } => TokenKind::Collateral,
            TokenType::Synthetic { .. } => TokenKind::Synthetic,
            TokenType::Native => TokenKind::Native,
        }
    }
}

/// Configuration of a warp route on a single chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpRouteConfig {
    #[serde(flatten)]
    pub token: TokenType,
    /// Owner of the deployed route.
    pub owner: String,
    /// Mailbox the route dispatches through.
    pub mailbox: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interchain_security_module: Option<ModuleReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<ModuleReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_routers: Option<RemoteRouters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_gas: Option<DestinationGas>,
}

impl WarpRouteConfig {
    /// Create a config with only the required fields set.
    pub fn new(token: TokenType, owner: impl Into<String>, mailbox: impl Into<String>) -> Self {
        Self {
            token,
            owner: owner.into(),
            mailbox: mailbox.into(),
            interchain_security_module: None,
            hook: None,
            remote_routers: None,
            destination_gas: None,
        }
    }

    /// Structurally validate the config.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        require("owner", &self.owner)?;
        require("mailbox", &self.mailbox)?;

        match &self.token {
            TokenType::Collateral { token } => require("token", token)?,
            TokenType::Synthetic {
                decimals: Some(decimals),
                ..
            } if *decimals > MAX_SYNTHETIC_DECIMALS => {
                return Err(ConfigValidationError::InvalidDecimals {
                    decimals: *decimals,
                    max: MAX_SYNTHETIC_DECIMALS,
                });
            }
            TokenType::Synthetic { .. } => {}
            TokenType::Native => {}
        }

        if let Some(routers) = &self.remote_routers {
            for (chain, router) in routers.iter() {
                if router.address.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyRemoteRouter {
                        chain: chain.clone(),
                    });
                }
            }
        }

        if let Some(gas) = &self.destination_gas {
            for (chain, value) in gas {
                if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ConfigValidationError::InvalidDestinationGas {
                        chain: chain.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Validate the config as the route deployed on `chain`.
    ///
    /// On top of [`Self::validate`], a route must never enroll itself as a remote router.
    pub fn validate_for_chain(&self, chain: &str) -> Result<(), ConfigValidationError> {
        self.validate()?;

        if self
            .remote_routers
            .as_ref()
            .is_some_and(|routers| routers.contains_key(chain))
        {
            return Err(ConfigValidationError::SelfRemoteRouter {
                chain: chain.to_string(),
            });
        }

        Ok(())
    }

    /// Return a copy with `remote_routers` replaced by `routers`.
    pub fn with_remote_routers(&self, routers: RemoteRouters) -> Self {
        Self {
            remote_routers: Some(routers),
            ..self.clone()
        }
    }

    /// Return a copy with every EVM-shaped address checksummed.
    pub fn normalize_addresses(&self) -> Self {
        let token = match &self.token {
            TokenType::Collateral { token } => TokenType::Collateral {
                token: normalize_address(token),
            },
            other => other.clone(),
        };

        Self {
            token,
            owner: normalize_address(&self.owner),
            mailbox: normalize_address(&self.mailbox),
            interchain_security_module: self
                .interchain_security_module
                .as_ref()
                .map(normalize_module),
            hook: self.hook.as_ref().map(normalize_module),
            remote_routers: self.remote_routers.as_ref().map(|routers| {
                routers
                    .iter()
                    .map(|(chain, router)| {
                        (
                            chain.clone(),
                            RemoteRouter {
                                address: normalize_address(&router.address),
                            },
                        )
                    })
                    .collect::<ChainMap<_>>()
                    .into()
            }),
            destination_gas: self.destination_gas.clone(),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigValidationError> {
    if value.trim().is_empty() {
        return Err(ConfigValidationError::MissingField { field });
    }
    Ok(())
}

fn normalize_module(module: &ModuleReference) -> ModuleReference {
    match module {
        ModuleReference::Address(address) => ModuleReference::Address(normalize_address(address)),
        inline => inline.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collateral() -> WarpRouteConfig {
        WarpRouteConfig::new(
            TokenType::Collateral {
                token: "uatom".to_string(),
            },
            "cosmos1owner",
            "cosmos1mailbox",
        )
    }

    #[test]
    fn test_valid_configs() {
        assert!(collateral().validate().is_ok());

        let synthetic = WarpRouteConfig::new(
            TokenType::Synthetic {
                name: Some("Wrapped Atom".to_string()),
                symbol: Some("wATOM".to_string()),
                decimals: Some(6),
            },
            "owner",
            "mailbox",
        );
        assert!(synthetic.validate().is_ok());

        let native = WarpRouteConfig::new(TokenType::Native, "owner", "mailbox");
        assert!(native.validate().is_ok());
    }

    #[test]
    fn test_missing_owner_and_mailbox() {
        let mut config = collateral();
        config.owner = "  ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::MissingField { field: "owner" })
        );

        let mut config = collateral();
        config.mailbox = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::MissingField { field: "mailbox" })
        );
    }

    #[test]
    fn test_collateral_requires_token() {
        let config = WarpRouteConfig::new(
            TokenType::Collateral {
                token: String::new(),
            },
            "owner",
            "mailbox",
        );
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::MissingField { field: "token" })
        );
    }

    #[test]
    fn test_synthetic_decimals_upper_bound() {
        let config = WarpRouteConfig::new(
            TokenType::Synthetic {
                name: None,
                symbol: None,
                decimals: Some(19),
            },
            "owner",
            "mailbox",
        );
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidDecimals {
                decimals: 19,
                max: 18
            })
        );
    }

    #[test]
    fn test_destination_gas_must_be_integer() {
        let mut config = collateral();
        config.destination_gas = Some(ChainMap::from([("beta".to_string(), "1.5".to_string())]));
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidDestinationGas { .. })
        ));

        config.destination_gas = Some(ChainMap::from([(
            "beta".to_string(),
            "200000".to_string(),
        )]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_self_remote_router_rejected() {
        let routers: RemoteRouters = ChainMap::from([(
            "alpha".to_string(),
            RemoteRouter {
                address: "0xAAA".to_string(),
            },
        )])
        .into();
        let config = collateral().with_remote_routers(routers);

        assert!(config.validate().is_ok());
        assert!(config.validate_for_chain("beta").is_ok());
        assert_eq!(
            config.validate_for_chain("alpha"),
            Err(ConfigValidationError::SelfRemoteRouter {
                chain: "alpha".to_string()
            })
        );
    }

    #[test]
    fn test_empty_remote_router_rejected() {
        let routers: RemoteRouters = ChainMap::from([(
            "beta".to_string(),
            RemoteRouter {
                address: String::new(),
            },
        )])
        .into();
        assert_eq!(
            collateral().with_remote_routers(routers).validate(),
            Err(ConfigValidationError::EmptyRemoteRouter {
                chain: "beta".to_string()
            })
        );
    }

    #[test]
    fn test_deserialize_tagged_config() {
        let config: WarpRouteConfig = serde_json::from_value(serde_json::json!({
            "type": "synthetic",
            "owner": "owner",
            "mailbox": "mailbox",
            "symbol": "wETH",
            "decimals": 18,
            "interchainSecurityModule": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "hook": { "type": "merkleTreeHook" },
            "destinationGas": { "beta": "100000" }
        }))
        .unwrap();

        assert_eq!(config.token.kind(), TokenKind::Synthetic);
        assert!(matches!(
            config.interchain_security_module,
            Some(ModuleReference::Address(_))
        ));
        assert!(matches!(config.hook, Some(ModuleReference::Inline(_))));

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["type"], "synthetic");
        assert_eq!(value["destinationGas"]["beta"], "100000");
        assert!(value.get("remoteRouters").is_none());
    }

    #[test]
    fn test_normalize_addresses() {
        let mut config = WarpRouteConfig::new(
            TokenType::Collateral {
                token: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string(),
            },
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "hyp1mailbox",
        );
        config.remote_routers = Some(
            ChainMap::from([(
                "beta".to_string(),
                RemoteRouter {
                    address: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string(),
                },
            )])
            .into(),
        );

        let normalized = config.normalize_addresses();
        let checksummed = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert_eq!(normalized.owner, checksummed);
        assert_eq!(normalized.mailbox, "hyp1mailbox");
        assert_eq!(
            normalized.token,
            TokenType::Collateral {
                token: checksummed.to_string()
            }
        );
        assert_eq!(
            normalized.remote_routers.unwrap()["beta"].address,
            checksummed
        );
    }
}
