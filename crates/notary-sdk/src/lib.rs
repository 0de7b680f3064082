//! Notary client core.
//!
//! Computes document digests, records them on a ledger-backed notary store,
//! and searches the store's entry log:
//! - [`StoreConnector`]: resolves the deployed store once, however many
//!   callers race for it
//! - [`EntryWriter`]: submits `(signer, digest)` entries
//! - [`EntrySearcher`] / [`EntryStream`]: filtered history replay plus live tail
//! - [`SearchSession`]: the caller-facing result list that a new search replaces
//! - [`Notary`]: all of the above behind one facade

pub mod config;
pub mod connection;
pub mod error;
pub mod filter;
pub mod notary;
pub mod search;
pub mod session;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use config::NotaryConfig;
pub use connection::{StoreConnector, StoreHandle};
pub use error::{NotaryError, NotaryResult};
pub use filter::{FilterPlan, SearchFilter};
pub use notary::Notary;
pub use search::{EntrySearcher, EntryStream};
pub use session::{SearchSession, SearchState};
pub use writer::EntryWriter;

// Re-export key types
pub use notary_crypto::DigestEngine;
pub use notary_ledger::{DevLedger, DevLedgerConfig, EventRange, LedgerTransport};
pub use notary_types::{DocumentDigest, NotarizationEntry, SignerIdentity, TxHash, Wei};
