/// Errors from digest computation.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// The environment cannot host the hashing work (no async runtime, or
    /// the hashing task was lost).
    #[error("digest environment unsupported: {0}")]
    EnvironmentUnsupported(String),

    /// Reading the document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DigestResult<T> = Result<T, DigestError>;
