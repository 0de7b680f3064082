//! Ledger file persistence: an exclusive save lock and atomic replacement.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{TransportError, TransportResult};

const LOCK_RETRY: Duration = Duration::from_millis(20);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Exclusive lock next to a ledger file (`<file>.lock`), held by whichever
/// process is saving. Released on drop.
pub(crate) struct SaveLock {
    path: PathBuf,
}

impl SaveLock {
    pub(crate) fn acquire(ledger_path: &Path) -> TransportResult<Self> {
        let mut name = ledger_path.as_os_str().to_owned();
        name.push(".lock");
        let path = PathBuf::from(name);

        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    debug!(lock = %path.display(), "ledger save lock acquired");
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(TransportError::Conflict(format!(
                            "ledger is locked by another writer ({}); remove it if no notary process is running",
                            path.display()
                        )));
                    }
                    thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for SaveLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to release ledger save lock");
        }
    }
}

/// Replace `path` with `bytes` so readers see either the old or the new
/// file, never a partial one.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> TransportResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| TransportError::Io(e.error))?;
    Ok(())
}
