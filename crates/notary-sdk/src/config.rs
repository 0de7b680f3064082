use std::path::Path;

use serde::{Deserialize, Serialize};

use notary_types::{SignerIdentity, Wei};

use crate::error::{NotaryError, NotaryResult};

fn default_store_name() -> String {
    "NotaryStore".into()
}

/// Client configuration.
///
/// `write_fee_wei` has no serde default: a config file must state the fee
/// it attaches to writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryConfig {
    /// Name of the deployed store to resolve.
    #[serde(default = "default_store_name")]
    pub store_name: String,
    /// Value attached to every write.
    #[serde(rename = "write_fee_wei")]
    pub write_fee: Wei,
    /// Overrides the transport's ambient account as the default origin.
    #[serde(default)]
    pub default_signer: Option<SignerIdentity>,
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            store_name: default_store_name(),
            write_fee: Wei::from_finney(1),
            default_signer: None,
        }
    }
}

impl NotaryConfig {
    pub fn from_toml_str(s: &str) -> NotaryResult<Self> {
        toml::from_str(s).map_err(|e| NotaryError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> NotaryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> NotaryResult<String> {
        toml::to_string_pretty(self).map_err(|e| NotaryError::Config(e.to_string()))
    }
}
