use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bytes::{strip_ledger_prefix, Bytes32};
use crate::error::TypeError;

/// Hex-encoded fingerprint of a document's bytes.
///
/// Produced by the digest engine as 64 lowercase hex characters with no
/// prefix. The client otherwise treats the value as opaque: an empty digest
/// is representable (writes treat it as "nothing to submit"), and encoding
/// to the ledger's [`Bytes32`] form is where malformed values are caught.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentDigest(String);

impl DocumentDigest {
    /// Number of hex characters in a 256-bit digest.
    pub const HEX_LEN: usize = 64;

    /// Wrap a digest string as-is.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Digest from raw hash output.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hex::encode(hash))
    }

    /// Parse user input: accepts an optional `0x` prefix and either case,
    /// returns the canonical lowercase form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let value = Bytes32::from_hex(strip_ledger_prefix(s.trim()))?;
        Ok(Self(value.to_hex()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for exactly 64 lowercase hex characters.
    pub fn is_canonical(&self) -> bool {
        self.0.len() == Self::HEX_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Reinterpret the hex text as the ledger's fixed-width byte-string.
    pub fn to_bytes32(&self) -> Result<Bytes32, TypeError> {
        Bytes32::from_hex(&self.0)
    }

    /// Short form for logs (first 8 characters).
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        self.0.get(..end).unwrap_or(&self.0)
    }
}

impl fmt::Debug for DocumentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentDigest({})", self.short())
    }
}

impl fmt::Display for DocumentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentDigest {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentDigest {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<Bytes32> for DocumentDigest {
    fn from(value: Bytes32) -> Self {
        Self(value.to_hex())
    }
}

impl AsRef<str> for DocumentDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_hash_is_64_lowercase_chars() {
        let digest = DocumentDigest::from_hash([0xAB; 32]);
        assert_eq!(digest.as_str().len(), DocumentDigest::HEX_LEN);
        assert!(digest.is_canonical());
        assert_eq!(digest.as_str(), "ab".repeat(32));
    }

    #[test]
    fn leading_zero_bytes_are_kept() {
        let mut hash = [0xFF; 32];
        hash[0] = 0x00;
        hash[4] = 0x0A;
        let digest = DocumentDigest::from_hash(hash);
        assert!(digest.as_str().starts_with("00ffffffff0a"));
        assert_eq!(digest.as_str().len(), 64);
    }

    #[test]
    fn parse_normalizes_prefix_and_case() {
        let upper = format!("0x{}", "AB".repeat(32));
        let digest = DocumentDigest::parse(&upper).unwrap();
        assert_eq!(digest.as_str(), "ab".repeat(32));
    }

    #[test]
    fn parse_rejects_short_input() {
        assert!(DocumentDigest::parse("abc").is_err());
    }

    #[test]
    fn empty_digest_is_representable() {
        let digest = DocumentDigest::default();
        assert!(digest.is_empty());
        assert!(!digest.is_canonical());
        assert!(digest.to_bytes32().is_err());
    }

    #[test]
    fn opaque_digest_fails_encoding() {
        let digest = DocumentDigest::new("not-a-digest");
        assert!(!digest.is_canonical());
        assert!(digest.to_bytes32().is_err());
    }

    #[test]
    fn bytes32_conversion_matches_text() {
        let digest = DocumentDigest::from_hash([7; 32]);
        let value = digest.to_bytes32().unwrap();
        assert_eq!(DocumentDigest::from(value), digest);
    }

    #[test]
    fn serializes_as_plain_string() {
        let digest = DocumentDigest::new("abcd");
        assert_eq!(serde_json::to_string(&digest).unwrap(), "\"abcd\"");
    }

    proptest! {
        #[test]
        fn parse_accepts_any_hash(bytes in any::<[u8; 32]>()) {
            let digest = DocumentDigest::from_hash(bytes);
            let parsed = DocumentDigest::parse(&digest.to_bytes32().unwrap().to_prefixed_hex()).unwrap();
            prop_assert_eq!(parsed, digest);
        }
    }
}
