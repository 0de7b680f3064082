use serde::{Deserialize, Serialize};

use notary_ledger::{EventQuery, DOCUMENT_HASH_KEY, ENTRY_EVENT, SIGNER_KEY};
use notary_types::{strip_ledger_prefix, Bytes32, SignerIdentity};

/// Optional criteria for an entry search. Absent or empty fields match
/// anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub signer: Option<SignerIdentity>,
    /// Plain hex digest; a `0x` prefix and upper case are tolerated.
    pub document_hash: Option<String>,
}

/// Outcome of turning a [`SearchFilter`] into a ledger query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterPlan {
    Supported(EventQuery),
    /// The criteria cannot be expressed; the search matches everything.
    Unsupported { reason: String },
}

impl FilterPlan {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    /// The query to run: the planned one, or match-all for an unsupported plan.
    pub fn into_query(self) -> EventQuery {
        match self {
            Self::Supported(query) => query,
            Self::Unsupported { .. } => EventQuery::for_event(ENTRY_EVENT),
        }
    }
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_signer(mut self, signer: impl Into<SignerIdentity>) -> Self {
        self.signer = Some(signer.into());
        self
    }

    pub fn by_document_hash(mut self, hash: impl Into<String>) -> Self {
        self.document_hash = Some(hash.into());
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.signer_criterion().is_none() && self.hash_criterion().is_none()
    }

    fn signer_criterion(&self) -> Option<&SignerIdentity> {
        self.signer.as_ref().filter(|s| !s.is_empty())
    }

    fn hash_criterion(&self) -> Option<&str> {
        self.document_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }

    /// Build the ledger query for these criteria.
    ///
    /// Digest criteria go to the ledger in its byte-string form (`0x` +
    /// lowercase hex). A digest that is not 32 bytes cannot be expressed
    /// and yields [`FilterPlan::Unsupported`].
    pub fn plan(&self) -> FilterPlan {
        let mut query = EventQuery::for_event(ENTRY_EVENT);
        if let Some(signer) = self.signer_criterion() {
            query = query.with(SIGNER_KEY, signer.as_str());
        }
        if let Some(hash) = self.hash_criterion() {
            match Bytes32::from_hex(strip_ledger_prefix(hash)) {
                Ok(bytes) => query = query.with(DOCUMENT_HASH_KEY, bytes.to_prefixed_hex()),
                Err(e) => {
                    return FilterPlan::Unsupported {
                        reason: format!("document hash {hash:?}: {e}"),
                    }
                }
            }
        }
        FilterPlan::Supported(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn empty_filter_matches_all_entries() {
        let plan = SearchFilter::new().plan();
        assert_eq!(plan, FilterPlan::Supported(EventQuery::for_event(ENTRY_EVENT)));
    }

    #[test]
    fn empty_strings_are_wildcards() {
        let filter = SearchFilter::new().by_signer("").by_document_hash("  ");
        assert!(filter.is_unconstrained());
        assert!(filter.plan().into_query().is_unconstrained());
    }

    #[test]
    fn digest_is_prefixed_and_lowercased() {
        let filter = SearchFilter::new().by_document_hash(format!("0X{}", DIGEST.to_uppercase()));
        let query = filter.plan().into_query();
        assert_eq!(
            query.conditions.get(DOCUMENT_HASH_KEY).map(String::as_str),
            Some(format!("0x{DIGEST}").as_str())
        );
    }

    #[test]
    fn both_criteria() {
        let query = SearchFilter::new()
            .by_signer("0xABC")
            .by_document_hash(DIGEST)
            .plan()
            .into_query();
        assert_eq!(query.conditions.len(), 2);
        assert_eq!(query.conditions.get(SIGNER_KEY).map(String::as_str), Some("0xABC"));
    }

    #[test]
    fn malformed_digest_is_unsupported() {
        let plan = SearchFilter::new().by_signer("0xABC").by_document_hash("xyz").plan();
        assert!(!plan.is_supported());
        assert_eq!(plan.into_query(), EventQuery::for_event(ENTRY_EVENT));
    }
}
