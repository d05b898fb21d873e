use thiserror::Error;

use crate::registry::{RegistryAddress, RegistryError};
use crate::router::DeploymentError;
use crate::status::MalformedEntry;

/// Error type for status checks.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The credential's status entry is present but unusable.
    #[error("bad_request: credentialStatus entry is not formatted correctly. Validity can not be determined.")]
    MalformedStatusEntry(#[from] MalformedEntry),
    /// The status entry is meant for another status method.
    #[error("bad_request: unsupported credentialStatus type: {0}")]
    UnsupportedStatusType(String),
    /// No handle is configured for the registry and network the entry names.
    #[error("not_supported: no revocation registry configured for {registry} on chain {chain_id}")]
    UnsupportedNetwork {
        chain_id: u64,
        registry: RegistryAddress,
    },
    /// The entry names a chain but no registry, and the chain has no known
    /// deployment.
    #[error("resolver_error: unable to determine the revocation registry address for chain {chain_id}")]
    DeploymentAddress {
        chain_id: u64,
        #[source]
        source: DeploymentError,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Error building a resolver from its configuration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Either infuraProjectId or chains must be configured")]
    MissingSource,
    #[error("infuraProjectId and chains are mutually exclusive")]
    ConflictingSources,
    #[error("registryAddress is required with infuraProjectId")]
    MissingRegistryAddress,
    #[error("No revocation registries configured")]
    NoRegistries,
    #[error("Revocation registry {registry} is configured twice on chain {chain_id}")]
    DuplicateRegistry {
        chain_id: u64,
        registry: RegistryAddress,
    },
    #[error("No revocation registry configured on default chain {0}")]
    NoDefaultRegistry(u64),
    #[error("Default revocation registry {registry} is not configured on chain {chain_id}")]
    DefaultNotConfigured {
        chain_id: u64,
        registry: RegistryAddress,
    },
    #[error("Error building HTTP client: {0}")]
    HttpClient(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_message() {
        let err = Error::from(MalformedEntry::MissingType);
        assert_eq!(
            err.to_string(),
            "bad_request: credentialStatus entry is not formatted correctly. Validity can not be determined."
        );
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "credentialStatus is missing its type");
    }
}
