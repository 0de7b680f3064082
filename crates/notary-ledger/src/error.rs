use thiserror::Error;

/// Errors surfaced by a ledger transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No connectivity to a ledger-capable runtime.
    #[error("ledger transport unavailable: {0}")]
    Unavailable(String),

    /// The named store (or address) is not deployed on this ledger.
    #[error("store not deployed: {0}")]
    NotDeployed(String),

    /// The store declined a write.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The event query shape cannot be encoded by the store.
    #[error("event filter rejected: {0}")]
    FilterRejected(String),

    /// The persisted ledger moved on since this copy was loaded.
    #[error("ledger conflict: {0}")]
    Conflict(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal ledger error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
