//! Status entry extraction.
//!
//! Credentials reach a status check as JSON objects, as JSON documents in
//! string form, or as JWTs carrying the credential (or a presentation) in
//! their claims. [`extract`] finds the `credentialStatus` entry in any of
//! these without assuming the format up front.

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::caip2::{ChainId, ChainIdParseError};
use crate::registry::{strip_hex_prefix, RegistryAddress};

/// `credentialStatus.type` handled by this crate.
pub const ETHR_REVOCATION_REGISTRY: &str = "EthrRevocationRegistry";

/// Message reported when a credential carries no status entry.
pub const MISSING_STATUS_MESSAGE: &str =
    "credentialStatus property was not set on the original credential";

const CREDENTIAL_STATUS: &str = "credentialStatus";

/// A credential to check, either as a JSON value or as an encoded string.
///
/// The string form may be a JWT (VC-JWT, VP-JWT, or a legacy JWT with the
/// status entry in its top-level claims) or a JSON document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CredentialOrJwt {
    Jwt(String),
    Credential(Value),
}

impl From<Value> for CredentialOrJwt {
    fn from(value: Value) -> Self {
        match value {
            Value::String(string) => Self::Jwt(string),
            value => Self::Credential(value),
        }
    }
}

impl From<String> for CredentialOrJwt {
    fn from(string: String) -> Self {
        Self::Jwt(string)
    }
}

impl From<&str> for CredentialOrJwt {
    fn from(string: &str) -> Self {
        Self::Jwt(string.to_string())
    }
}

/// Reason a present `credentialStatus` entry cannot be used.
#[derive(Error, Debug)]
pub enum MalformedEntry {
    #[error("credentialStatus is not an object")]
    NotAnObject,
    #[error("credentialStatus is missing its type")]
    MissingType,
    #[error("Invalid credentialStatus entry: {0}")]
    InvalidField(#[from] serde_json::Error),
}

/// Pointer into an on-chain revocation registry.
///
/// `namespace`, `revocation_list` and `revocation_key` are opaque and are
/// passed to the registry as found in the credential.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "type")]
    pub type_: String,
    pub namespace: String,
    pub revocation_list: String,
    pub revocation_key: String,
    #[serde(default, deserialize_with = "deserialize_chain_id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryAddress>,
}

/// Outcome of a status check.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StatusResult {
    pub revoked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResult {
    pub fn revoked(revoked: bool) -> Self {
        Self {
            revoked,
            message: None,
        }
    }

    /// Result for a credential without a status entry.
    pub fn missing_status() -> Self {
        Self {
            revoked: false,
            message: Some(MISSING_STATUS_MESSAGE.to_string()),
        }
    }
}

/// Parse a chain id given as a decimal string, a `0x` hex string, or a
/// CAIP-2 `eip155:<n>` identifier.
pub fn parse_chain_id(chain_id: &str) -> Result<u64, ChainIdParseError> {
    if chain_id.contains(':') {
        return chain_id.parse::<ChainId>()?.eip155_chain_id();
    }
    let parsed = match strip_hex_prefix(chain_id) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => chain_id.parse(),
    };
    parsed.map_err(|_| ChainIdParseError::Eip155Reference(chain_id.to_string()))
}

fn deserialize_chain_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        String(String),
    }
    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Number(chain_id)) => Ok(Some(chain_id)),
        Some(Repr::String(chain_id)) => parse_chain_id(&chain_id)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Find the status entry of a credential.
///
/// Returns `Ok(None)` when the credential has no status entry, including when
/// a string credential is neither a JWT nor JSON. A status entry that is
/// present but unusable is an error.
pub fn extract(credential: &CredentialOrJwt) -> Result<Option<StatusEntry>, MalformedEntry> {
    let status = match credential {
        CredentialOrJwt::Jwt(string) | CredentialOrJwt::Credential(Value::String(string)) => {
            status_from_str(string)
        }
        CredentialOrJwt::Credential(credential) => credential.get(CREDENTIAL_STATUS).cloned(),
    };
    classify(status)
}

fn status_from_str(credential: &str) -> Option<Value> {
    match crate::jwt::decode_unverified::<Value>(credential) {
        Ok(claims) => status_from_claims(&claims),
        Err(jwt_err) => {
            debug!("Credential is not a JWT ({jwt_err}), trying JSON");
            match serde_json::from_str::<Value>(credential) {
                Ok(credential) => credential.get(CREDENTIAL_STATUS).cloned(),
                Err(json_err) => {
                    debug!("Credential is not JSON either: {json_err}");
                    None
                }
            }
        }
    }
}

fn status_from_claims(claims: &Value) -> Option<Value> {
    // VC-JWT, then VP-JWT, then legacy JWT claims.
    [
        claims.get("vc").and_then(|vc| vc.get(CREDENTIAL_STATUS)),
        claims.get("vp").and_then(|vp| vp.get(CREDENTIAL_STATUS)),
        claims.get(CREDENTIAL_STATUS),
    ]
    .into_iter()
    .flatten()
    .find(|status| !status.is_null())
    .cloned()
}

fn classify(status: Option<Value>) -> Result<Option<StatusEntry>, MalformedEntry> {
    let status = match status {
        None | Some(Value::Null) => return Ok(None),
        Some(status) => status,
    };
    let object = status.as_object().ok_or(MalformedEntry::NotAnObject)?;
    match object.get("type") {
        Some(Value::String(type_)) if !type_.is_empty() => {}
        _ => return Err(MalformedEntry::MissingType),
    }
    Ok(Some(serde_json::from_value(status)?))
}
