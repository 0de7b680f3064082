use serde::{Deserialize, Serialize};

use notary_types::{SignerIdentity, Wei};

/// First account of the dev ledger; also the default transaction origin.
pub const DEFAULT_DEV_ACCOUNT: &str = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1";

/// Store deployed at genesis unless configured otherwise.
pub const DEFAULT_STORE_NAME: &str = "NotaryStore";

/// Configuration for the [`DevLedger`](crate::DevLedger).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevLedgerConfig {
    /// Minimum value a write must carry.
    #[serde(rename = "min_fee_wei")]
    pub min_fee: Wei,
    /// Ambient accounts; the first is the default origin.
    pub accounts: Vec<SignerIdentity>,
    /// Stores deployed at genesis.
    pub stores: Vec<String>,
}

impl Default for DevLedgerConfig {
    fn default() -> Self {
        Self {
            min_fee: Wei::from_finney(1),
            accounts: vec![SignerIdentity::from(DEFAULT_DEV_ACCOUNT)],
            stores: vec![DEFAULT_STORE_NAME.to_string()],
        }
    }
}
