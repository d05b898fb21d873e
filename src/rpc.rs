//! Ethereum JSON-RPC client for revocation registry contracts.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use keccak_hash::keccak;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::registry::{strip_hex_prefix, RegistryAddress, RegistryError, RevocationRegistry};

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Solidity signature of the registry's revocation lookup.
pub const IS_REVOKED_SIGNATURE: &str = "isRevoked(address,bytes32,bytes32)";

/// A JSON-RPC endpoint of an Ethereum node.
///
/// Cloning is cheap; clones share the underlying HTTP connection pool.
#[derive(Debug, Clone)]
pub struct Connection {
    url: String,
    client: reqwest::Client,
}

/// HTTP client sending this crate's `User-Agent`.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "User-Agent",
        reqwest::header::HeaderValue::from_static(USER_AGENT),
    );
    reqwest::Client::builder().default_headers(headers).build()
}

impl Connection {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(url, http_client()?))
    }

    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Revocation registry contract reached over Ethereum JSON-RPC.
#[derive(Debug)]
pub struct EthRpcRegistry {
    connection: Connection,
    address: RegistryAddress,
    request_id: AtomicU64,
}

impl EthRpcRegistry {
    pub fn new(connection: Connection, address: RegistryAddress) -> Self {
        Self {
            connection,
            address,
            request_id: AtomicU64::new(1),
        }
    }

    /// `eth_call` against the registry contract at the latest block.
    async fn call(&self, data: String) -> Result<Vec<u8>, RegistryError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_call",
            "params": [{ "to": self.address.to_string(), "data": data }, "latest"],
        });
        debug!("eth_call {} at {}", self.address, self.connection.url);
        let resp = self
            .connection
            .client
            .post(&self.connection.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;
        if let Err(err) = resp.error_for_status_ref() {
            return Err(match err.status() {
                Some(status) => RegistryError::HttpStatus(status.as_u16()),
                None => RegistryError::Request(err.to_string()),
            });
        }
        let response: RpcResponse = resp
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        if let Some(RpcError { code, message }) = response.error {
            return Err(RegistryError::Rpc { code, message });
        }
        match response.result {
            Some(Value::String(result)) => decode_hex(&result)
                .ok_or_else(|| RegistryError::InvalidResponse(format!("Invalid result: {result}"))),
            Some(result) => Err(RegistryError::InvalidResponse(format!(
                "Expected hex string result, found {result}"
            ))),
            None => Err(RegistryError::InvalidResponse("Missing result".to_string())),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RevocationRegistry for EthRpcRegistry {
    async fn is_revoked(
        &self,
        namespace: &str,
        list: &str,
        revocation_key: &str,
    ) -> Result<bool, RegistryError> {
        let data = encode_is_revoked(namespace, list, revocation_key)?;
        let output = self.call(data).await?;
        decode_bool(&output)
    }
}

/// First four bytes of the Keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak(signature.as_bytes()).to_fixed_bytes();
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encoded call data for `isRevoked(address,bytes32,bytes32)`.
pub fn encode_is_revoked(
    namespace: &str,
    list: &str,
    revocation_key: &str,
) -> Result<String, RegistryError> {
    let mut data = Vec::with_capacity(4 + 3 * 32);
    data.extend_from_slice(&selector(IS_REVOKED_SIGNATURE));
    // address: left-padded to a 32-byte word
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(&fixed_bytes::<20>("namespace", namespace)?);
    data.extend_from_slice(&fixed_bytes::<32>("list", list)?);
    data.extend_from_slice(&fixed_bytes::<32>("revocationKey", revocation_key)?);
    Ok(format!("0x{}", hex::encode(data)))
}

fn fixed_bytes<const N: usize>(name: &'static str, value: &str) -> Result<[u8; N], RegistryError> {
    let invalid = || RegistryError::InvalidArgument {
        name,
        value: value.to_string(),
    };
    let digits = strip_hex_prefix(value).ok_or_else(invalid)?;
    let mut bytes = [0u8; N];
    hex::decode_to_slice(digits, &mut bytes).map_err(|_| invalid())?;
    Ok(bytes)
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
    hex::decode(strip_hex_prefix(value)?).ok()
}

/// Decode an ABI-encoded `bool` return value.
fn decode_bool(output: &[u8]) -> Result<bool, RegistryError> {
    match output {
        [] => Err(RegistryError::InvalidResponse(
            "Empty result, is the registry deployed at this address?".to_string(),
        )),
        [word @ .., last] if output.len() == 32 && word.iter().all(|b| *b == 0) && *last <= 1 => {
            Ok(*last == 1)
        }
        _ => Err(RegistryError::InvalidResponse(format!(
            "Expected a 32-byte boolean, found 0x{}",
            hex::encode(output)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMESPACE: &str = "0x6B6B873eaB06D331fFA6c431aC874Ff954A2c317";
    const LIST: &str = "0x3458b9bfc7963978b7d40ef225177c45193c2889902357db3b043a4e319a9627";
    const KEY: &str = "0x89343794d2fb7dd5d0fba9593a4bb13beaff93a61577029176d0117b0c53b8e6";

    #[test]
    fn erc20_selector() {
        // Well-known selector of transfer(address,uint256)
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn encode_call() {
        let data = encode_is_revoked(NAMESPACE, LIST, KEY).unwrap();
        let bytes = hex::decode(&data[2..]).unwrap();
        assert_eq!(bytes.len(), 4 + 3 * 32);
        assert_eq!(&bytes[..4], &selector(IS_REVOKED_SIGNATURE));
        assert_eq!(&bytes[4..16], &[0u8; 12]);
        assert_eq!(
            hex::encode(&bytes[16..36]),
            "6b6b873eab06d331ffa6c431ac874ff954a2c317"
        );
        assert_eq!(format!("0x{}", hex::encode(&bytes[36..68])), LIST);
        assert_eq!(format!("0x{}", hex::encode(&bytes[68..100])), KEY);
    }

    #[test]
    fn encode_upper_case_prefix() {
        let upper = |value: &str| value.replacen("0x", "0X", 1);
        assert_eq!(
            encode_is_revoked(&upper(NAMESPACE), &upper(LIST), &upper(KEY)).unwrap(),
            encode_is_revoked(NAMESPACE, LIST, KEY).unwrap()
        );
    }

    #[test]
    fn reject_unencodable_arguments() {
        assert!(matches!(
            encode_is_revoked("did:ethr:0x6B6B", LIST, KEY),
            Err(RegistryError::InvalidArgument {
                name: "namespace",
                ..
            })
        ));
        assert!(matches!(
            encode_is_revoked(NAMESPACE, "0x1234", KEY),
            Err(RegistryError::InvalidArgument { name: "list", .. })
        ));
        assert!(matches!(
            encode_is_revoked(NAMESPACE, LIST, "revoked"),
            Err(RegistryError::InvalidArgument {
                name: "revocationKey",
                ..
            })
        ));
    }

    #[test]
    fn decode_output() {
        let mut word = [0u8; 32];
        assert!(!decode_bool(&word).unwrap());
        word[31] = 1;
        assert!(decode_bool(&word).unwrap());
        word[31] = 2;
        assert!(decode_bool(&word).is_err());
        assert!(decode_bool(&[]).is_err());
        assert!(decode_bool(&[1]).is_err());
    }
}
