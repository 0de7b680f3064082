//! Digest engine for the notary client.
//!
//! Computes the SHA-256 fingerprint of a document and renders it as the
//! 64-character lowercase hex string the rest of the client passes around.
//! Hashing wraps the `sha2` crate.

pub mod engine;
pub mod error;

pub use engine::{DigestBuilder, DigestEngine};
pub use error::{DigestError, DigestResult};
