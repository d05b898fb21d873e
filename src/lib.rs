//! Credential status checks against Ethereum revocation registries.
//!
//! A credential using this status method carries a `credentialStatus` entry
//! of type `EthrRevocationRegistry` pointing into an on-chain registry:
//!
//! ```json
//! "credentialStatus": {
//!   "id": "https://example.edu/status/24",
//!   "type": "EthrRevocationRegistry",
//!   "chainId": 11155111,
//!   "registry": "0x...",
//!   "namespace": "0x6B6B873eaB06D331fFA6c431aC874Ff954A2c317",
//!   "revocationList": "0x3458b9bfc7963978b7d40ef225177c45193c2889902357db3b043a4e319a9627",
//!   "revocationKey": "0x89343794d2fb7dd5d0fba9593a4bb13beaff93a61577029176d0117b0c53b8e6"
//! }
//! ```
//!
//! [`EthrRevocationRegistry::check_status`] finds that entry in a JSON
//! credential, a JSON string, or a JWT ([`status`]), picks the registry
//! handle configured for the entry's chain and registry ([`router`]), and
//! asks it whether the key is revoked. `chainId` and `registry` are optional:
//! without `chainId` the configured default registry is used, and without
//! `registry` the chain's canonical deployment is used.
//!
//! The credential's signature is not verified here; revocation status is
//! independent of authenticity.
//!
//! # Example
//!
//! ```no_run
//! use ethr_revocation_registry::{EthrRevocationRegistry, ResolverConfig};
//!
//! # async fn example(jwt: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let config: ResolverConfig = r#"{
//!     "infuraProjectId": "<project id>",
//!     "registryAddress": "0x534b89bf5c5d2dd1fd8a4de4f5c95a5f3e13e6f5",
//!     "defaultChainId": 11155111
//! }"#
//! .parse()?;
//! let resolver = EthrRevocationRegistry::from_config(&config)?;
//! let result = resolver.check_status(&jwt.into(), None).await?;
//! println!("revoked: {}", result.revoked);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

pub mod caip2;
pub mod config;
pub mod error;
pub mod jws;
pub mod jwt;
pub mod network;
pub mod registry;
pub mod router;
#[cfg(feature = "rpc")]
pub mod rpc;
pub mod status;

pub use config::{ChainConfig, ResolverConfig};
pub use error::{ConfigError, Error};
pub use network::Network;
pub use registry::{RegistryAddress, RegistryError, RevocationRegistry};
pub use router::{DefaultRegistry, KnownDeployments, RegistryHandle, RegistryRouter};
pub use status::{CredentialOrJwt, StatusEntry, StatusResult, ETHR_REVOCATION_REGISTRY};

/// A credential status method.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait StatusResolver: Sync {
    /// The `credentialStatus.type` this method handles.
    fn status_type(&self) -> &'static str;

    /// Check the revocation status of `credential`.
    ///
    /// `did_document` is the resolved document of the credential's issuer,
    /// for status methods that need it.
    async fn check_status(
        &self,
        credential: &CredentialOrJwt,
        did_document: Option<&Value>,
    ) -> Result<StatusResult, Error>;
}

/// `EthrRevocationRegistry` status method.
#[derive(Debug)]
pub struct EthrRevocationRegistry {
    router: RegistryRouter,
}

impl EthrRevocationRegistry {
    pub fn new(router: RegistryRouter) -> Self {
        Self { router }
    }

    /// Build JSON-RPC registry handles for every configured chain.
    #[cfg(feature = "rpc")]
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ConfigError> {
        use std::sync::Arc;

        let endpoints = config.endpoints()?;
        let default = config.default_registry()?;
        let deployments = config.known_deployments()?;
        // One connection pool shared by every endpoint.
        let client = rpc::http_client().map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let handles = endpoints.into_iter().map(|endpoint| {
            let connection = rpc::Connection::with_client(endpoint.rpc_url, client.clone());
            RegistryHandle::new(
                endpoint.chain_id,
                endpoint.registry_address,
                rpc::EthRpcRegistry::new(connection, endpoint.registry_address),
            )
        });
        let router = RegistryRouter::new(handles, default, Arc::new(deployments))?;
        Ok(Self::new(router))
    }

    pub fn router(&self) -> &RegistryRouter {
        &self.router
    }

    /// Check the revocation status of `credential`.
    ///
    /// A credential without a status entry is reported as not revoked, with
    /// an explanatory message. A malformed status entry, a status entry for
    /// another status method, or one addressing an unconfigured registry is
    /// an error, as is any failure of the on-chain query.
    pub async fn check_status(
        &self,
        credential: &CredentialOrJwt,
        _did_document: Option<&Value>,
    ) -> Result<StatusResult, Error> {
        let entry = match status::extract(credential)? {
            Some(entry) => entry,
            None => {
                warn!("{}", status::MISSING_STATUS_MESSAGE);
                return Ok(StatusResult::missing_status());
            }
        };
        if entry.type_ != ETHR_REVOCATION_REGISTRY {
            return Err(Error::UnsupportedStatusType(entry.type_));
        }
        debug!(
            "Checking {} status {:?}",
            ETHR_REVOCATION_REGISTRY, entry.id
        );
        self.router.resolve(&entry).await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl StatusResolver for EthrRevocationRegistry {
    fn status_type(&self) -> &'static str {
        ETHR_REVOCATION_REGISTRY
    }

    async fn check_status(
        &self,
        credential: &CredentialOrJwt,
        did_document: Option<&Value>,
    ) -> Result<StatusResult, Error> {
        EthrRevocationRegistry::check_status(self, credential, did_document).await
    }
}
