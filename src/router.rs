//! Selection of the registry handle addressed by a status entry.
//!
//! Handles are keyed by `(registry address, chain id)`. An entry that names a
//! chain is only ever checked on that chain: when the chain or registry it
//! names is not configured, routing fails rather than falling back to the
//! default network.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use crate::error::{ConfigError, Error};
use crate::registry::{RegistryAddress, RevocationRegistry};
use crate::status::{StatusEntry, StatusResult};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeploymentError {
    #[error("No known revocation registry deployment for chain {0}")]
    UnknownChain(u64),
}

/// Canonical registry contract address per network.
pub trait DeploymentAddresses: Send + Sync {
    fn deployment_address(&self, chain_id: u64) -> Result<RegistryAddress, DeploymentError>;
}

/// Fixed table of registry deployments.
#[derive(Debug, Clone, Default)]
pub struct KnownDeployments(HashMap<u64, RegistryAddress>);

impl KnownDeployments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, chain_id: u64, address: RegistryAddress) -> Self {
        self.insert(chain_id, address);
        self
    }

    pub fn insert(&mut self, chain_id: u64, address: RegistryAddress) -> Option<RegistryAddress> {
        self.0.insert(chain_id, address)
    }
}

impl FromIterator<(u64, RegistryAddress)> for KnownDeployments {
    fn from_iter<I: IntoIterator<Item = (u64, RegistryAddress)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl DeploymentAddresses for KnownDeployments {
    fn deployment_address(&self, chain_id: u64) -> Result<RegistryAddress, DeploymentError> {
        self.0
            .get(&chain_id)
            .copied()
            .ok_or(DeploymentError::UnknownChain(chain_id))
    }
}

/// A query handle together with the registry and network it answers for.
#[derive(Clone)]
pub struct RegistryHandle {
    pub chain_id: u64,
    pub registry: RegistryAddress,
    pub handle: Arc<dyn RevocationRegistry>,
}

impl RegistryHandle {
    pub fn new(
        chain_id: u64,
        registry: RegistryAddress,
        handle: impl RevocationRegistry + 'static,
    ) -> Self {
        Self {
            chain_id,
            registry,
            handle: Arc::new(handle),
        }
    }
}

impl fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("chain_id", &self.chain_id)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Registry checked for status entries that do not name a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultRegistry {
    pub chain_id: u64,
    pub registry: RegistryAddress,
}

/// Immutable routing table from `(registry, chain id)` to query handle.
pub struct RegistryRouter {
    handles: HashMap<(RegistryAddress, u64), Arc<dyn RevocationRegistry>>,
    default: DefaultRegistry,
    deployments: Arc<dyn DeploymentAddresses>,
}

impl RegistryRouter {
    /// Build the routing table.
    ///
    /// Fails if no handles are given, if a `(registry, chain id)` pair is
    /// configured twice, or if the default registry has no handle.
    pub fn new(
        handles: impl IntoIterator<Item = RegistryHandle>,
        default: DefaultRegistry,
        deployments: Arc<dyn DeploymentAddresses>,
    ) -> Result<Self, ConfigError> {
        let mut table = HashMap::new();
        for RegistryHandle {
            chain_id,
            registry,
            handle,
        } in handles
        {
            if table.insert((registry, chain_id), handle).is_some() {
                return Err(ConfigError::DuplicateRegistry { chain_id, registry });
            }
        }
        if table.is_empty() {
            return Err(ConfigError::NoRegistries);
        }
        if !table.contains_key(&(default.registry, default.chain_id)) {
            return Err(ConfigError::DefaultNotConfigured {
                chain_id: default.chain_id,
                registry: default.registry,
            });
        }
        Ok(Self {
            handles: table,
            default,
            deployments,
        })
    }

    pub fn default_registry(&self) -> &DefaultRegistry {
        &self.default
    }

    /// Configured `(registry, chain id)` pairs.
    pub fn registries(&self) -> impl Iterator<Item = (&RegistryAddress, u64)> {
        self.handles
            .keys()
            .map(|(registry, chain_id)| (registry, *chain_id))
    }

    /// Select the handle addressed by `entry`.
    pub fn route(&self, entry: &StatusEntry) -> Result<&Arc<dyn RevocationRegistry>, Error> {
        let (registry, chain_id) = match entry.chain_id {
            Some(chain_id) => {
                let registry = match entry.registry {
                    Some(registry) => registry,
                    None => self
                        .deployments
                        .deployment_address(chain_id)
                        .map_err(|source| Error::DeploymentAddress { chain_id, source })?,
                };
                (registry, chain_id)
            }
            None => {
                if let Some(registry) = entry.registry {
                    warn!(
                        "Ignoring registry {registry} of status entry without chainId, using default registry {}",
                        self.default.registry
                    );
                }
                (self.default.registry, self.default.chain_id)
            }
        };
        match self.handles.get(&(registry, chain_id)) {
            Some(handle) => {
                debug!("Routing status check to registry {registry} on chain {chain_id}");
                Ok(handle)
            }
            None => {
                warn!("No revocation registry configured for {registry} on chain {chain_id}");
                Err(Error::UnsupportedNetwork { chain_id, registry })
            }
        }
    }

    /// Check `entry` against the registry it addresses.
    pub async fn resolve(&self, entry: &StatusEntry) -> Result<StatusResult, Error> {
        let handle = self.route(entry)?;
        let revoked = handle
            .is_revoked(&entry.namespace, &entry.revocation_list, &entry.revocation_key)
            .await?;
        Ok(StatusResult::revoked(revoked))
    }
}

impl fmt::Debug for RegistryRouter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegistryRouter")
            .field("registries", &self.handles.keys().collect::<Vec<_>>())
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
