use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use notary_ledger::DevLedgerConfig;
use notary_sdk::NotaryConfig;

/// Settings file for the CLI.
///
/// Both sections are optional; a `[notary]` section must state
/// `write_fee_wei`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub notary: NotaryConfig,
    pub ledger: DevLedgerConfig,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_types::Wei;

    #[test]
    fn no_file_means_defaults() {
        let s = Settings::load(None).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn load_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notary.toml");
        std::fs::write(
            &path,
            r#"
[notary]
store_name = "Registry"
write_fee_wei = 500

[ledger]
min_fee_wei = 100
stores = ["Registry"]
"#,
        )
        .unwrap();

        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.notary.store_name, "Registry");
        assert_eq!(s.notary.write_fee, Wei::new(500));
        assert_eq!(s.ledger.min_fee, Wei::new(100));
        assert_eq!(s.ledger.stores, vec!["Registry".to_string()]);
        assert_eq!(s.ledger.accounts, DevLedgerConfig::default().accounts);
    }

    #[test]
    fn notary_section_requires_fee() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notary.toml");
        std::fs::write(&path, "[notary]\nstore_name = \"Registry\"\n").unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/notary.toml"))).is_err());
    }
}
