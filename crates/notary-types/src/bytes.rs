use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Prefix the ledger uses to mark a value as a hex byte-string.
pub const LEDGER_HEX_PREFIX: &str = "0x";

/// Remove the ledger byte-string prefix, if present.
///
/// Digests travel to the ledger as `0x`-prefixed byte-strings and come back
/// the same way; callers only ever see the plain hex form.
pub fn strip_ledger_prefix(s: &str) -> &str {
    s.strip_prefix(LEDGER_HEX_PREFIX)
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Fixed-width 32-byte value in the ledger's byte-string encoding.
///
/// A hex digest is reinterpreted byte-for-byte: `"00ff.."` becomes
/// `[0x00, 0xff, ..]`, never a number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bytes32([u8; 32]);

impl Bytes32 {
    /// Width of the value in bytes.
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex characters without a prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != Self::LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Parse the ledger form, which must carry the `0x` prefix.
    pub fn parse_prefixed(s: &str) -> Result<Self, TypeError> {
        let stripped = strip_ledger_prefix(s);
        if stripped.len() == s.len() {
            return Err(TypeError::MissingPrefix(s.to_string()));
        }
        Self::from_hex(stripped)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Ledger form: `0x` followed by 64 lowercase hex characters.
    pub fn to_prefixed_hex(&self) -> String {
        format!("{LEDGER_HEX_PREFIX}{}", self.to_hex())
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({}..)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefixed_hex())
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
