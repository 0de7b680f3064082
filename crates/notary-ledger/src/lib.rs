//! Ledger transport boundary for the notary client.
//!
//! The ledger itself is an external service. This crate defines what the
//! client needs from it:
//! - [`LedgerTransport`]: resolve a deployed store, submit writes, open
//!   ranged + live event subscriptions with key-based filters
//! - The event model ([`LedgerEvent`], [`EventQuery`], [`EventRange`])
//! - [`DevLedger`]: an in-process implementation for tests and local demos

pub mod config;
pub mod error;
pub mod event;
pub mod memory;
mod persist;
pub mod transaction;
pub mod transport;

pub use config::DevLedgerConfig;
pub use error::{TransportError, TransportResult};
pub use event::{
    BlockTag, EventQuery, EventRange, LedgerEvent, Subscription, SubscriptionId,
    DOCUMENT_HASH_KEY, ENTRY_EVENT, SIGNER_KEY,
};
pub use memory::{DevLedger, LedgerSnapshot};
pub use transaction::{StoreCall, TransactionRequest};
pub use transport::LedgerTransport;
