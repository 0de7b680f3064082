use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::DocumentDigest;
use crate::identity::SignerIdentity;

/// Ledger-assigned reference for a submitted write.
///
/// Returned as soon as the ledger accepts the transaction; it says nothing
/// about finality or when the entry becomes visible to searches.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn short_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.short_hex())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A notarization as read back from the ledger.
///
/// `document_hash` is always in plain hex, without the ledger's byte-string
/// prefix, so it compares equal to what the digest engine produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotarizationEntry {
    pub signer: SignerIdentity,
    pub document_hash: DocumentDigest,
    /// Block the entry was included in.
    pub block_number: u64,
    /// Position of the entry's event within its block.
    pub log_index: u32,
    pub tx_hash: TxHash,
}

impl NotarizationEntry {
    /// Ledger ordering position `(block, log index)`.
    pub fn position(&self) -> (u64, u32) {
        (self.block_number, self.log_index)
    }
}
