use serde::{Deserialize, Serialize};

use notary_types::{Bytes32, SignerIdentity, StoreAddress, Wei};

/// A call on the notary store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreCall {
    /// Record `(sender, document_hash)` as a permanent entry.
    Create { document_hash: Bytes32 },
}

impl StoreCall {
    /// Method name as exposed by the store.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
        }
    }
}

/// A write transaction addressed to a deployed store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub to: StoreAddress,
    pub from: SignerIdentity,
    pub call: StoreCall,
    /// Value attached to satisfy the store's write policy.
    pub value: Wei,
}

impl TransactionRequest {
    pub fn create(to: StoreAddress, from: SignerIdentity, document_hash: Bytes32, value: Wei) -> Self {
        Self {
            to,
            from,
            call: StoreCall::Create { document_hash },
            value,
        }
    }
}
