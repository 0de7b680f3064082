use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the account that signs a notarization.
///
/// Supplied by an external wallet or identity provider. The client never
/// validates or generates it; filters compare it by exact string equality.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerIdentity(String);

impl SignerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SignerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignerIdentity({})", self.0)
    }
}

impl fmt::Display for SignerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignerIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SignerIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// On-ledger address of a deployed store.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreAddress(String);

impl StoreAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Address from 20 raw bytes, in `0x`-prefixed lowercase hex.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoreAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreAddress({})", self.0)
    }
}

impl fmt::Display for StoreAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_is_opaque() {
        let signer = SignerIdentity::from("0xABC");
        assert_eq!(signer.as_str(), "0xABC");
        assert_eq!(signer.to_string(), "0xABC");
        assert_ne!(signer, SignerIdentity::from("0xabc"));
    }

    #[test]
    fn blank_signer_is_empty() {
        assert!(SignerIdentity::default().is_empty());
        assert!(SignerIdentity::from("   ").is_empty());
        assert!(!SignerIdentity::from("alice").is_empty());
    }

    #[test]
    fn address_from_bytes() {
        let addr = StoreAddress::from_bytes([0x01; 20]);
        assert_eq!(addr.as_str().len(), 42);
        assert!(addr.as_str().starts_with("0x0101"));
    }
}
