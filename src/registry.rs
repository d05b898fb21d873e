//! On-chain revocation registry handles.
//!
//! A [`RevocationRegistry`] answers revocation queries against one registry
//! contract on one network. The resolver never looks inside the namespace,
//! list or key it forwards; encoding them for the chain is the handle's job.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors of an on-chain revocation query.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A query argument cannot be encoded for the registry contract.
    #[error("Invalid {name} argument: {value}")]
    InvalidArgument { name: &'static str, value: String },
    #[error("Error sending JSON-RPC request: {0}")]
    Request(String),
    #[error("JSON-RPC endpoint returned HTTP status {0}")]
    HttpStatus(u16),
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Invalid JSON-RPC response: {0}")]
    InvalidResponse(String),
}

/// A query handle for a single revocation registry on a single network.
///
/// Handles are shared between concurrent status checks and must not rely on
/// being called sequentially.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RevocationRegistry: Send + Sync {
    /// Returns `true` if `revocation_key` is marked revoked in `list` under
    /// `namespace`.
    async fn is_revoked(
        &self,
        namespace: &str,
        list: &str,
        revocation_key: &str,
    ) -> Result<bool, RegistryError>;
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid registry address: {0}")]
pub struct AddressParseError(pub String);

/// Address of a registry contract.
///
/// Checksummed (EIP-55) and lower-case spellings of the same address compare
/// equal; the address is displayed in lower-case hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct RegistryAddress([u8; 20]);

/// Hex digits of a `0x`/`0X`-prefixed string.
pub(crate) fn strip_hex_prefix(value: &str) -> Option<&str> {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))
}

impl FromStr for RegistryAddress {
    type Err = AddressParseError;
    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let digits =
            strip_hex_prefix(address).ok_or_else(|| AddressParseError(address.to_string()))?;
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| AddressParseError(address.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for RegistryAddress {
    type Error = AddressParseError;
    fn try_from(address: String) -> Result<Self, Self::Error> {
        address.parse()
    }
}

impl From<RegistryAddress> for String {
    fn from(address: RegistryAddress) -> String {
        address.to_string()
    }
}

impl fmt::Display for RegistryAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address() {
        let checksummed: RegistryAddress = "0x6B6B873eaB06D331fFA6c431aC874Ff954A2c317"
            .parse()
            .unwrap();
        let lower: RegistryAddress = "0x6b6b873eab06d331ffa6c431ac874ff954a2c317"
            .parse()
            .unwrap();
        assert_eq!(checksummed, lower);
        assert_eq!(
            checksummed.to_string(),
            "0x6b6b873eab06d331ffa6c431ac874ff954a2c317"
        );
        let upper_prefix: RegistryAddress = "0X6B6B873EAB06D331FFA6C431AC874FF954A2C317"
            .parse()
            .unwrap();
        assert_eq!(upper_prefix, lower);
    }

    #[test]
    fn reject_invalid_address() {
        for address in [
            "",
            "6b6b873eab06d331ffa6c431ac874ff954a2c317",
            "0x6b6b873eab06d331ffa6c431ac874ff954a2c3",
            "0x6b6b873eab06d331ffa6c431ac874ff954a2c3zz",
        ] {
            assert_eq!(
                RegistryAddress::from_str(address),
                Err(AddressParseError(address.to_string()))
            );
        }
    }

    #[test]
    fn serde_address() {
        let address: RegistryAddress =
            serde_json::from_str("\"0x6B6B873eaB06D331fFA6c431aC874Ff954A2c317\"").unwrap();
        assert_eq!(
            serde_json::to_string(&address).unwrap(),
            "\"0x6b6b873eab06d331ffa6c431ac874ff954a2c317\""
        );
        assert!(serde_json::from_str::<RegistryAddress>("\"0x12\"").is_err());
    }
}
