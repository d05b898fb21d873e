use serde::de::DeserializeOwned;

use crate::jws::Error;

// RFC 7519 - JSON Web Token (JWT)

/// Decode the claims of a JWT without verifying its signature.
pub fn decode_unverified<Claims: DeserializeOwned>(jwt: &str) -> Result<Claims, Error> {
    let (_header, payload) = crate::jws::decode_unverified(jwt)?;
    let claims = serde_json::from_slice(&payload)?;
    Ok(claims)
}
