use std::sync::Arc;

use tracing::{debug, info};

use notary_ledger::TransactionRequest;
use notary_types::{strip_ledger_prefix, Bytes32, DocumentDigest, SignerIdentity, TxHash, Wei};

use crate::connection::StoreConnector;
use crate::error::{NotaryError, NotaryResult};

/// Submits notarization entries to the store.
pub struct EntryWriter {
    connector: Arc<StoreConnector>,
    fee: Wei,
}

impl EntryWriter {
    pub fn new(connector: Arc<StoreConnector>, fee: Wei) -> Self {
        Self { connector, fee }
    }

    /// Value attached to each write.
    pub fn fee(&self) -> Wei {
        self.fee
    }

    /// Record `(signer, digest)` on the store.
    ///
    /// An empty digest submits nothing and returns `Ok(None)`. An empty
    /// signer falls back to the store handle's default origin. The returned
    /// hash acknowledges submission only; the entry may not be visible to
    /// searches yet.
    pub async fn create_entry(
        &self,
        digest: &DocumentDigest,
        signer: &SignerIdentity,
    ) -> NotaryResult<Option<TxHash>> {
        if digest.is_empty() {
            debug!("empty digest, nothing submitted");
            return Ok(None);
        }

        let handle = self.connector.handle().await?;

        let document_hash = Bytes32::from_hex(strip_ledger_prefix(digest.as_str())).map_err(|e| {
            NotaryError::SubmissionRejected(format!("document hash is not a 32-byte value: {e}"))
        })?;
        let from = if signer.is_empty() {
            handle
                .default_origin()
                .cloned()
                .ok_or(NotaryError::MissingSigner)?
        } else {
            signer.clone()
        };

        let request = TransactionRequest::create(handle.address().clone(), from, document_hash, self.fee);
        let tx = handle.transport().send_transaction(request).await?;

        info!(digest = digest.short(), tx = %tx.short_hex(), "entry submitted");
        Ok(Some(tx))
    }
}
