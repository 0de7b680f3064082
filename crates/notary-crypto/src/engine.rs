use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;
use tracing::debug;

use notary_types::DocumentDigest;

use crate::error::{DigestError, DigestResult};

/// Buffers at or above this size are hashed on the blocking pool.
const DEFAULT_OFFLOAD_THRESHOLD: usize = 1024 * 1024;

/// Read size for streaming file digests.
const READ_CHUNK: usize = 64 * 1024;

/// Incremental SHA-256 digest for documents read in chunks.
#[derive(Clone, Default)]
pub struct DigestBuilder {
    hasher: Sha256,
    len: u64,
}

impl DigestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) -> &mut Self {
        self.hasher.update(chunk);
        self.len += chunk.len() as u64;
        self
    }

    /// Bytes consumed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finalize(self) -> DocumentDigest {
        DocumentDigest::from_hash(self.hasher.finalize().into())
    }
}

/// Computes document digests.
///
/// Small buffers are hashed in place; large ones are moved to the runtime's
/// blocking pool so the caller's task suspends instead of stalling its
/// worker. The output is always 64 lowercase hex characters.
#[derive(Clone, Debug)]
pub struct DigestEngine {
    offload_threshold: usize,
}

impl DigestEngine {
    /// Name of the digest primitive.
    pub const ALGORITHM: &'static str = "SHA-256";

    pub const fn new() -> Self {
        Self {
            offload_threshold: DEFAULT_OFFLOAD_THRESHOLD,
        }
    }

    /// Override the size at which hashing moves to the blocking pool.
    pub const fn with_offload_threshold(mut self, bytes: usize) -> Self {
        self.offload_threshold = bytes;
        self
    }

    /// Hash bytes synchronously on the current thread.
    pub fn digest(data: &[u8]) -> DocumentDigest {
        DocumentDigest::from_hash(Sha256::digest(data).into())
    }

    /// Compute the digest of a buffer.
    ///
    /// Fails with [`DigestError::EnvironmentUnsupported`] when a large buffer
    /// must be offloaded but no Tokio runtime is running, or when the
    /// offloaded task does not complete.
    pub async fn compute_digest(&self, bytes: impl Into<Arc<[u8]>>) -> DigestResult<DocumentDigest> {
        let bytes: Arc<[u8]> = bytes.into();
        if bytes.len() < self.offload_threshold {
            return Ok(Self::digest(&bytes));
        }

        let handle = runtime_handle()?;
        let len = bytes.len();
        let digest = handle
            .spawn_blocking(move || Self::digest(&bytes))
            .await
            .map_err(|e| DigestError::EnvironmentUnsupported(format!("digest task failed: {e}")))?;
        debug!(len, digest = digest.short(), "offloaded digest computed");
        Ok(digest)
    }

    /// Stream a file through the hasher without loading it whole.
    pub async fn compute_file_digest(&self, path: &Path) -> DigestResult<DocumentDigest> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut builder = DigestBuilder::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            builder.update(&buf[..n]);
        }
        debug!(path = %path.display(), len = builder.len(), "file digest computed");
        Ok(builder.finalize())
    }

    /// Check that `data` hashes to `expected`.
    pub fn verify(data: &[u8], expected: &DocumentDigest) -> bool {
        Self::digest(data) == *expected
    }
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn runtime_handle() -> DigestResult<Handle> {
    Handle::try_current().map_err(|e| {
        DigestError::EnvironmentUnsupported(format!("no async runtime for digest work: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[tokio::test]
    async fn hello_matches_known_vector() {
        let digest = DigestEngine::new().compute_digest(&b"hello"[..]).await.unwrap();
        assert_eq!(digest.as_str(), HELLO_SHA256);
    }

    #[tokio::test]
    async fn empty_buffer_has_a_digest() {
        let digest = DigestEngine::new().compute_digest(Vec::<u8>::new()).await.unwrap();
        assert_eq!(digest.as_str(), EMPTY_SHA256);
    }

    #[tokio::test]
    async fn offloaded_digest_matches_inline() {
        let data = vec![0x5Au8; 4096];
        let inline = DigestEngine::new().compute_digest(data.clone()).await.unwrap();
        let offloaded = DigestEngine::new()
            .with_offload_threshold(1024)
            .compute_digest(data)
            .await
            .unwrap();
        assert_eq!(inline, offloaded);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn offload_works_on_current_thread_runtime() {
        let digest = DigestEngine::new()
            .with_offload_threshold(0)
            .compute_digest(&b"hello"[..])
            .await
            .unwrap();
        assert_eq!(digest.as_str(), HELLO_SHA256);
    }

    #[test]
    fn missing_runtime_is_environment_unsupported() {
        let err = runtime_handle().unwrap_err();
        assert!(matches!(err, DigestError::EnvironmentUnsupported(_)));
    }

    /// Drive a future on the current thread with no async runtime installed.
    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        use std::task::{Context, Poll, Wake, Waker};

        struct ThreadWaker(std::thread::Thread);

        impl Wake for ThreadWaker {
            fn wake(self: Arc<Self>) {
                self.0.unpark();
            }
        }

        let waker = Waker::from(Arc::new(ThreadWaker(std::thread::current())));
        let mut cx = Context::from_waker(&waker);
        let mut fut = std::pin::pin!(fut);
        loop {
            match fut.as_mut().poll(&mut cx) {
                Poll::Ready(out) => return out,
                Poll::Pending => std::thread::park(),
            }
        }
    }

    #[test]
    fn offloaded_digest_without_runtime_is_environment_unsupported() {
        let engine = DigestEngine::new().with_offload_threshold(0);
        let err = block_on(engine.compute_digest(&b"hello"[..])).unwrap_err();
        assert!(matches!(err, DigestError::EnvironmentUnsupported(_)));
    }

    #[test]
    fn inline_digest_needs_no_runtime() {
        let digest = block_on(DigestEngine::new().compute_digest(&b"hello"[..])).unwrap();
        assert_eq!(digest.as_str(), HELLO_SHA256);
    }

    #[test]
    fn builder_matches_one_shot() {
        let mut builder = DigestBuilder::new();
        builder.update(b"hel").update(b"lo");
        assert_eq!(builder.len(), 5);
        assert_eq!(builder.finalize().as_str(), HELLO_SHA256);
    }

    #[test]
    fn empty_builder() {
        let builder = DigestBuilder::new();
        assert!(builder.is_empty());
        assert_eq!(builder.finalize().as_str(), EMPTY_SHA256);
    }

    #[test]
    fn verify_detects_tampering() {
        let digest = DigestEngine::digest(b"original");
        assert!(DigestEngine::verify(b"original", &digest));
        assert!(!DigestEngine::verify(b"tampered", &digest));
    }

    #[tokio::test]
    async fn file_digest_matches_buffer_digest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let engine = DigestEngine::new();
        let from_file = engine.compute_file_digest(file.path()).await.unwrap();
        let from_buffer = engine.compute_digest(data).await.unwrap();
        assert_eq!(from_file, from_buffer);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = DigestEngine::new()
            .compute_file_digest(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::Io(_)));
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            prop_assert_eq!(DigestEngine::digest(&data), DigestEngine::digest(&data));
        }

        #[test]
        fn digest_is_64_lowercase_hex(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let digest = DigestEngine::digest(&data);
            prop_assert_eq!(digest.as_str().len(), 64);
            prop_assert!(digest.is_canonical());
        }

        #[test]
        fn single_byte_change_changes_digest(
            data in proptest::collection::vec(any::<u8>(), 1..512),
            index in any::<prop::sample::Index>(),
        ) {
            let mut altered = data.clone();
            let i = index.index(altered.len());
            altered[i] ^= 0x01;
            prop_assert_ne!(DigestEngine::digest(&data), DigestEngine::digest(&altered));
        }
    }
}
