use std::path::Path;
use std::sync::Arc;

use notary_crypto::DigestEngine;
use notary_ledger::{EventRange, LedgerTransport};
use notary_types::{DocumentDigest, SignerIdentity, TxHash};

use crate::config::NotaryConfig;
use crate::connection::StoreConnector;
use crate::error::NotaryResult;
use crate::filter::SearchFilter;
use crate::search::{EntrySearcher, EntryStream};
use crate::session::SearchSession;
use crate::writer::EntryWriter;

/// High-level notary client API.
pub struct Notary {
    config: NotaryConfig,
    digests: DigestEngine,
    connector: Arc<StoreConnector>,
    writer: EntryWriter,
    searcher: EntrySearcher,
}

impl Notary {
    /// Client over the given ledger transport.
    pub fn new(transport: Arc<dyn LedgerTransport>, config: NotaryConfig) -> Self {
        let connector = StoreConnector::new(transport, &config);
        Self::with_connector(Arc::new(connector), config)
    }

    /// Client without a ledger. Digests work; every ledger operation fails
    /// with `TransportUnavailable`.
    pub fn offline(config: NotaryConfig) -> Self {
        let connector = StoreConnector::detached(&config);
        Self::with_connector(Arc::new(connector), config)
    }

    fn with_connector(connector: Arc<StoreConnector>, config: NotaryConfig) -> Self {
        Self {
            digests: DigestEngine::new(),
            writer: EntryWriter::new(Arc::clone(&connector), config.write_fee),
            searcher: EntrySearcher::new(Arc::clone(&connector)),
            connector,
            config,
        }
    }

    pub fn config(&self) -> &NotaryConfig {
        &self.config
    }

    pub fn connector(&self) -> &Arc<StoreConnector> {
        &self.connector
    }

    // ---- Digests ----

    pub async fn compute_digest(&self, bytes: impl Into<Arc<[u8]>>) -> NotaryResult<DocumentDigest> {
        Ok(self.digests.compute_digest(bytes).await?)
    }

    pub async fn compute_file_digest(&self, path: &Path) -> NotaryResult<DocumentDigest> {
        Ok(self.digests.compute_file_digest(path).await?)
    }

    // ---- Entries ----

    pub async fn create_entry(
        &self,
        digest: &DocumentDigest,
        signer: &SignerIdentity,
    ) -> NotaryResult<Option<TxHash>> {
        self.writer.create_entry(digest, signer).await
    }

    // ---- Search ----

    /// One-shot search: history since genesis, then the live tail.
    pub async fn search(&self, filter: &SearchFilter) -> NotaryResult<EntryStream> {
        self.searcher.open(filter).await
    }

    pub async fn search_range(&self, filter: &SearchFilter, range: EventRange) -> NotaryResult<EntryStream> {
        self.searcher.open_range(filter, range).await
    }

    /// A result list that each new search replaces.
    pub fn session(&self) -> SearchSession {
        SearchSession::new(self.searcher.clone())
    }
}
