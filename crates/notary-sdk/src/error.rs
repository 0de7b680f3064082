use thiserror::Error;

use notary_crypto::DigestError;
use notary_ledger::TransportError;

#[derive(Debug, Error)]
pub enum NotaryError {
    #[error("environment unsupported: {0}")]
    EnvironmentUnsupported(String),

    #[error("ledger transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("store not deployed: {0}")]
    StoreNotDeployed(String),

    #[error("no signer identity available")]
    MissingSigner,

    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for NotaryError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Unavailable(reason) => Self::TransportUnavailable(reason),
            TransportError::NotDeployed(name) => Self::StoreNotDeployed(name),
            TransportError::Rejected(reason) => Self::SubmissionRejected(reason),
            other => Self::Transport(other),
        }
    }
}

impl From<DigestError> for NotaryError {
    fn from(e: DigestError) -> Self {
        match e {
            DigestError::EnvironmentUnsupported(reason) => Self::EnvironmentUnsupported(reason),
            DigestError::Io(io) => Self::Io(io),
        }
    }
}

pub type NotaryResult<T> = Result<T, NotaryError>;
