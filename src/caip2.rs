use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// CAIP-2 namespace of EVM chains, whose reference is the EIP-155 chain id.
pub const EIP155: &str = "eip155";

/// <https://github.com/ChainAgnostic/CAIPs/blob/master/CAIPs/caip-2.md>
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ChainId {
    pub namespace: String,
    pub reference: String,
}

const NAMESPACE_MIN_LENGTH: usize = 3;
const NAMESPACE_MAX_LENGTH: usize = 8;
const REFERENCE_MIN_LENGTH: usize = 1;
const REFERENCE_MAX_LENGTH: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChainIdParseError {
    #[error("Unexpected character in namespace: {0}")]
    NamespaceChar(char),
    #[error("Namespace too long")]
    NamespaceTooLong,
    #[error("Namespace too short")]
    NamespaceTooShort,
    #[error("Unexpected character in reference: {0}")]
    ReferenceChar(char),
    #[error("Reference too long")]
    ReferenceTooLong,
    #[error("Reference too short")]
    ReferenceTooShort,
    #[error("Missing separator between namespace and reference")]
    MissingSeparator,
    #[error("Expected namespace eip155, found {0}")]
    NotEip155(String),
    #[error("Invalid EIP-155 chain id: {0}")]
    Eip155Reference(String),
}

impl ChainId {
    pub fn eip155(chain_id: u64) -> Self {
        Self {
            namespace: EIP155.to_string(),
            reference: chain_id.to_string(),
        }
    }

    /// Numeric chain id of an `eip155` chain.
    pub fn eip155_chain_id(&self) -> Result<u64, ChainIdParseError> {
        if self.namespace != EIP155 {
            return Err(ChainIdParseError::NotEip155(self.namespace.clone()));
        }
        self.reference
            .parse()
            .map_err(|_| ChainIdParseError::Eip155Reference(self.reference.clone()))
    }
}

impl FromStr for ChainId {
    type Err = ChainIdParseError;
    fn from_str(chain_id: &str) -> Result<Self, Self::Err> {
        let (namespace, reference) = chain_id
            .split_once(':')
            .ok_or(ChainIdParseError::MissingSeparator)?;

        // namespace:   [-a-z0-9]{3,8}
        if let Some(c) = namespace
            .chars()
            .find(|c| !matches!(c, '-' | 'a'..='z' | '0'..='9'))
        {
            return Err(ChainIdParseError::NamespaceChar(c));
        }
        if namespace.len() < NAMESPACE_MIN_LENGTH {
            return Err(ChainIdParseError::NamespaceTooShort);
        }
        if namespace.len() > NAMESPACE_MAX_LENGTH {
            return Err(ChainIdParseError::NamespaceTooLong);
        }

        // reference:   [-_a-zA-Z0-9]{1,32}
        if let Some(c) = reference
            .chars()
            .find(|c| !matches!(c, '-' | '_' | 'a'..='z' | 'A'..='Z' | '0'..='9'))
        {
            return Err(ChainIdParseError::ReferenceChar(c));
        }
        if reference.len() < REFERENCE_MIN_LENGTH {
            return Err(ChainIdParseError::ReferenceTooShort);
        }
        if reference.len() > REFERENCE_MAX_LENGTH {
            return Err(ChainIdParseError::ReferenceTooLong);
        }

        Ok(Self {
            namespace: namespace.to_string(),
            reference: reference.to_string(),
        })
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id() {
        // https://github.com/ChainAgnostic/CAIPs/blob/master/CAIPs/caip-2.md#test-cases
        let dummy_max_length = "chainstd:8c3444cf8970a9e41a706fab93e7a6c4";
        let chain_id = ChainId::from_str(dummy_max_length).unwrap();
        assert_eq!(chain_id.to_string(), dummy_max_length);

        let reference_too_long = format!("{}0", dummy_max_length);
        assert_eq!(
            ChainId::from_str(&reference_too_long).unwrap_err(),
            ChainIdParseError::ReferenceTooLong
        );
        assert_eq!(
            ChainId::from_str("ab:1").unwrap_err(),
            ChainIdParseError::NamespaceTooShort
        );
        assert_eq!(
            ChainId::from_str("eip155").unwrap_err(),
            ChainIdParseError::MissingSeparator
        );
        assert_eq!(
            ChainId::from_str("eip155:1.5").unwrap_err(),
            ChainIdParseError::ReferenceChar('.')
        );
    }

    #[test]
    fn eip155() {
        let sepolia = ChainId::from_str("eip155:11155111").unwrap();
        assert_eq!(sepolia.eip155_chain_id().unwrap(), 11155111);
        assert_eq!(ChainId::eip155(11155111), sepolia);

        let bip122 = ChainId::from_str("bip122:000000000019d6689c085ae165831e93").unwrap();
        assert!(matches!(
            bip122.eip155_chain_id(),
            Err(ChainIdParseError::NotEip155(_))
        ));
        let named = ChainId::from_str("eip155:mainnet").unwrap();
        assert!(matches!(
            named.eip155_chain_id(),
            Err(ChainIdParseError::Eip155Reference(_))
        ));
    }
}
