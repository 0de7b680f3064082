//! Foundation types for the notary client.
//!
//! Every other notary crate depends on `notary-types`. The ledger owns all
//! durable state; the client only carries digests, identities and the
//! entries it reads back.
//!
//! # Key Types
//!
//! - [`DocumentDigest`] — Lowercase hex SHA-256 fingerprint of a document
//! - [`SignerIdentity`] — Opaque account identifier supplied by a wallet
//! - [`Bytes32`] — The ledger's fixed-width byte-string encoding (`0x`-prefixed)
//! - [`NotarizationEntry`] — A `(signer, digest)` pair read back from the ledger
//! - [`TxHash`] — Acknowledgement reference for a submitted write
//! - [`Wei`] — Value attached to a write to satisfy the store's fee policy

pub mod bytes;
pub mod digest;
pub mod entry;
pub mod error;
pub mod identity;
pub mod value;

pub use bytes::{strip_ledger_prefix, Bytes32, LEDGER_HEX_PREFIX};
pub use digest::DocumentDigest;
pub use entry::{NotarizationEntry, TxHash};
pub use error::TypeError;
pub use identity::{SignerIdentity, StoreAddress};
pub use value::Wei;
