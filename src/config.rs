//! Resolver configuration.
//!
//! A resolver is configured in one of two shapes: an Infura project id and a
//! registry address, which covers every [well-known network](Network); or an
//! explicit list of chains, each with its registry address and JSON-RPC
//! endpoint. Supplying both, or neither, is an error.
//!
//! ```json
//! {
//!   "chains": [
//!     { "chainId": 11155111, "registryAddress": "0x...", "rpcUrl": "https://..." }
//!   ],
//!   "defaultChainId": 11155111
//! }
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::network::Network;
use crate::registry::RegistryAddress;
use crate::router::{DefaultRegistry, KnownDeployments};

/// A registry contract on one chain, reached through one JSON-RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    pub registry_address: RegistryAddress,
    pub rpc_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infura_project_id: Option<String>,
    /// Registry used on every well-known network, with `infura_project_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_address: Option<RegistryAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<ChainConfig>>,
    /// Chain checked for status entries without a `chainId`.
    pub default_chain_id: u64,
    /// Registry checked for status entries without a `chainId`.
    ///
    /// Defaults to `registry_address`, or to the first chain configured on
    /// `default_chain_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_registry: Option<RegistryAddress>,
    /// Canonical registry address per chain id, for status entries that name
    /// a chain but no registry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deployments: BTreeMap<u64, RegistryAddress>,
}

/// Where a resolver's registry handles come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrySource<'a> {
    Infura {
        project_id: &'a str,
        registry: RegistryAddress,
    },
    Chains(&'a [ChainConfig]),
}

impl ResolverConfig {
    /// Configuration for the well-known networks through Infura.
    pub fn infura(
        project_id: impl Into<String>,
        registry: RegistryAddress,
        default_network: Network,
    ) -> Self {
        Self {
            infura_project_id: Some(project_id.into()),
            registry_address: Some(registry),
            chains: None,
            default_chain_id: default_network.chain_id(),
            default_registry: None,
            deployments: BTreeMap::new(),
        }
    }

    /// Configuration for an explicit list of chains.
    pub fn chains(chains: Vec<ChainConfig>, default_chain_id: u64) -> Self {
        Self {
            infura_project_id: None,
            registry_address: None,
            chains: Some(chains),
            default_chain_id,
            default_registry: None,
            deployments: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> Result<RegistrySource<'_>, ConfigError> {
        match (&self.infura_project_id, &self.chains) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingSources),
            (None, None) => Err(ConfigError::MissingSource),
            (Some(project_id), None) => Ok(RegistrySource::Infura {
                project_id,
                registry: self
                    .registry_address
                    .ok_or(ConfigError::MissingRegistryAddress)?,
            }),
            (None, Some(chains)) if chains.is_empty() => Err(ConfigError::NoRegistries),
            (None, Some(chains)) => Ok(RegistrySource::Chains(chains)),
        }
    }

    /// Every configured `(chain, registry, endpoint)` triple.
    pub fn endpoints(&self) -> Result<Vec<ChainConfig>, ConfigError> {
        Ok(match self.source()? {
            RegistrySource::Infura {
                project_id,
                registry,
            } => Network::ALL
                .into_iter()
                .map(|network| ChainConfig {
                    chain_id: network.chain_id(),
                    registry_address: registry,
                    rpc_url: network.infura_url(project_id),
                })
                .collect(),
            RegistrySource::Chains(chains) => chains.to_vec(),
        })
    }

    pub fn default_registry(&self) -> Result<DefaultRegistry, ConfigError> {
        let chain_id = self.default_chain_id;
        let registry = match (self.default_registry, self.source()?) {
            (Some(registry), _) => registry,
            (None, RegistrySource::Infura { registry, .. }) => registry,
            (None, RegistrySource::Chains(chains)) => chains
                .iter()
                .find(|chain| chain.chain_id == chain_id)
                .map(|chain| chain.registry_address)
                .ok_or(ConfigError::NoDefaultRegistry(chain_id))?,
        };
        Ok(DefaultRegistry { chain_id, registry })
    }

    /// Registry deployments: the configured `deployments`, and with the
    /// Infura shape, `registry_address` on every well-known network.
    pub fn known_deployments(&self) -> Result<KnownDeployments, ConfigError> {
        let mut deployments: KnownDeployments = match self.source()? {
            RegistrySource::Infura { registry, .. } => Network::ALL
                .into_iter()
                .map(|network| (network.chain_id(), registry))
                .collect(),
            RegistrySource::Chains(_) => KnownDeployments::new(),
        };
        for (chain_id, address) in &self.deployments {
            deployments.insert(*chain_id, *address);
        }
        Ok(deployments)
    }
}

impl FromStr for ResolverConfig {
    type Err = ConfigError;
    fn from_str(config: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::DeploymentAddresses;
    use serde_json::json;

    const REGISTRY: &str = "0x534b89bf5c5d2dd1fd8a4de4f5c95a5f3e13e6f5";
    const OTHER_REGISTRY: &str = "0x0000000000000000000000000000000000000002";

    fn registry() -> RegistryAddress {
        REGISTRY.parse().unwrap()
    }

    #[test]
    fn infura_shape() {
        let config: ResolverConfig = json!({
            "infuraProjectId": "abc123",
            "registryAddress": REGISTRY,
            "defaultChainId": 11155111,
        })
        .to_string()
        .parse()
        .unwrap();
        assert_eq!(
            config.source().unwrap(),
            RegistrySource::Infura {
                project_id: "abc123",
                registry: registry()
            }
        );
        let endpoints = config.endpoints().unwrap();
        assert_eq!(endpoints.len(), Network::ALL.len());
        assert!(endpoints.contains(&ChainConfig {
            chain_id: 1,
            registry_address: registry(),
            rpc_url: "https://mainnet.infura.io/v3/abc123".to_string(),
        }));
        assert_eq!(
            config.default_registry().unwrap(),
            DefaultRegistry {
                chain_id: 11155111,
                registry: registry()
            }
        );
        let deployments = config.known_deployments().unwrap();
        assert_eq!(deployments.deployment_address(5).unwrap(), registry());
        assert!(deployments.deployment_address(137).is_err());
    }

    #[test]
    fn chains_shape() {
        let config: ResolverConfig = json!({
            "chains": [
                { "chainId": 137, "registryAddress": OTHER_REGISTRY, "rpcUrl": "http://localhost:8545" },
                { "chainId": 137, "registryAddress": REGISTRY, "rpcUrl": "http://localhost:8545" },
            ],
            "defaultChainId": 137,
            "deployments": { "137": REGISTRY },
        })
        .to_string()
        .parse()
        .unwrap();
        assert!(matches!(config.source().unwrap(), RegistrySource::Chains(chains) if chains.len() == 2));
        assert_eq!(config.endpoints().unwrap(), config.chains.clone().unwrap());
        // First chain configured on the default chain id.
        assert_eq!(
            config.default_registry().unwrap().registry.to_string(),
            OTHER_REGISTRY
        );
        let deployments = config.known_deployments().unwrap();
        assert_eq!(deployments.deployment_address(137).unwrap(), registry());
        assert!(deployments.deployment_address(1).is_err());
    }

    #[test]
    fn explicit_default_registry() {
        let mut config = ResolverConfig::chains(
            vec![ChainConfig {
                chain_id: 137,
                registry_address: registry(),
                rpc_url: "http://localhost:8545".to_string(),
            }],
            137,
        );
        config.default_registry = Some(OTHER_REGISTRY.parse().unwrap());
        assert_eq!(
            config.default_registry().unwrap().registry.to_string(),
            OTHER_REGISTRY
        );

        config.default_registry = None;
        config.default_chain_id = 1;
        assert!(matches!(
            config.default_registry(),
            Err(ConfigError::NoDefaultRegistry(1))
        ));
    }

    #[test]
    fn invalid_shapes() {
        let mut config = ResolverConfig::infura("abc123", registry(), Network::Mainnet);
        config.chains = Some(Vec::new());
        assert!(matches!(
            config.source(),
            Err(ConfigError::ConflictingSources)
        ));

        config.infura_project_id = None;
        assert!(matches!(config.source(), Err(ConfigError::NoRegistries)));

        config.chains = None;
        assert!(matches!(config.source(), Err(ConfigError::MissingSource)));

        config.infura_project_id = Some("abc123".to_string());
        config.registry_address = None;
        assert!(matches!(
            config.source(),
            Err(ConfigError::MissingRegistryAddress)
        ));
    }

    #[test]
    fn reject_invalid_json() {
        assert!(matches!(
            ResolverConfig::from_str(r#"{"infuraProjectId": "abc123"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ResolverConfig::from_str(
                r#"{"infuraProjectId": "abc123", "registryAddress": "0x12", "defaultChainId": 1}"#
            ),
            Err(ConfigError::Json(_))
        ));
    }
}
