//! Compact JWS decoding, without signature verification.
//!
//! Revocation status is orthogonal to authenticity, so tokens are only ever
//! opened here to read their claims. Verifying the signature is left to the
//! caller's credential verification pipeline.

use serde_json::{Map, Value};

// RFC 7515 - JSON Web Signature (JWS)

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Not three dot-separated segments
    #[error("Invalid JWS")]
    InvalidJWS,
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// JOSE header, as an arbitrary JSON object.
pub type Header = Map<String, Value>;

pub fn split_jws(jws: &str) -> Result<(&str, &str, &str), Error> {
    let mut parts = jws.splitn(3, '.');
    Ok(
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), Some(c), None) => (a, b, c),
            _ => return Err(Error::InvalidJWS),
        },
    )
}

/// Decode the header and payload of a compact JWS.
///
/// The signature segment is not decoded, and may be empty for unsigned
/// tokens. No header parameter is required or enforced: `alg` and `crit`
/// only matter to signature verification. The payload is taken verbatim
/// when the header sets `"b64": false` (RFC 7797).
pub fn decode_unverified(jws: &str) -> Result<(Header, Vec<u8>), Error> {
    let (header_b64, payload_enc, signature_b64) = split_jws(jws)?;
    if signature_b64.contains('.') {
        return Err(Error::InvalidJWS);
    }
    let header_json = base64::decode_config(header_b64, base64::URL_SAFE_NO_PAD)?;
    let header: Header = serde_json::from_slice(&header_json)?;
    let payload = if header.get("b64").and_then(Value::as_bool).unwrap_or(true) {
        base64::decode_config(payload_enc, base64::URL_SAFE_NO_PAD)?
    } else {
        payload_enc.as_bytes().to_vec()
    };
    Ok((header, payload))
}
