use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use notary_ledger::{
    EventRange, LedgerEvent, SubscriptionId, TransportError, DOCUMENT_HASH_KEY, ENTRY_EVENT,
    SIGNER_KEY,
};
use notary_types::{DocumentDigest, NotarizationEntry, SignerIdentity};

use crate::connection::{StoreConnector, StoreHandle};
use crate::error::NotaryResult;
use crate::filter::{FilterPlan, SearchFilter};

/// Opens filtered subscriptions over the store's entry log.
#[derive(Clone)]
pub struct EntrySearcher {
    connector: Arc<StoreConnector>,
}

impl EntrySearcher {
    pub fn new(connector: Arc<StoreConnector>) -> Self {
        Self { connector }
    }

    /// Replay every matching entry since genesis, then follow new ones.
    pub async fn open(&self, filter: &SearchFilter) -> NotaryResult<EntryStream> {
        self.open_range(filter, EventRange::full()).await
    }

    /// Like [`open`](Self::open) over an explicit block range.
    ///
    /// Criteria the ledger cannot express never fail the search: they are
    /// logged and replaced by the match-all query.
    pub async fn open_range(&self, filter: &SearchFilter, range: EventRange) -> NotaryResult<EntryStream> {
        let handle = self.connector.handle().await?;

        let plan = filter.plan();
        if let FilterPlan::Unsupported { reason } = &plan {
            warn!(%reason, "search filter unsupported, matching all entries");
        }
        let query = plan.into_query();

        let transport = handle.transport();
        let subscription = match transport.subscribe(handle.address(), query.clone(), range).await {
            Ok(subscription) => subscription,
            Err(TransportError::FilterRejected(reason)) if !query.is_unconstrained() => {
                warn!(%reason, "ledger rejected search filter, matching all entries");
                transport
                    .subscribe(handle.address(), query.unconstrained(), range)
                    .await?
            }
            Err(e) => return Err(e.into()),
        };

        debug!(id = %subscription.id, live = range.is_live(), "search subscribed");
        Ok(EntryStream {
            handle,
            id: subscription.id,
            events: subscription.events,
            delivered: 0,
            closed: false,
        })
    }
}

/// Ordered stream of entries from one subscription.
///
/// Ends when the range is exhausted or the transport drops. Dropping the
/// stream releases the subscription.
pub struct EntryStream {
    handle: Arc<StoreHandle>,
    id: SubscriptionId,
    events: mpsc::UnboundedReceiver<LedgerEvent>,
    delivered: usize,
    closed: bool,
}

impl EntryStream {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn handle(&self) -> &Arc<StoreHandle> {
        &self.handle
    }

    /// Entries yielded so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Next entry in ledger order, or `None` once the stream has ended.
    /// Events that do not decode as entries are skipped.
    pub async fn next(&mut self) -> Option<NotarizationEntry> {
        if self.closed {
            return None;
        }
        loop {
            let Some(event) = self.events.recv().await else {
                debug!(id = %self.id, delivered = self.delivered, "search stream ended");
                return None;
            };
            match entry_from_event(&event) {
                Some(entry) => {
                    self.delivered += 1;
                    debug!(block = entry.block_number, digest = entry.document_hash.short(), "entry delivered");
                    return Some(entry);
                }
                None => warn!(block = event.block_number, tx = %event.tx_hash.short_hex(), "skipping malformed entry event"),
            }
        }
    }

    /// Drain the stream until it ends.
    pub async fn collect(mut self) -> Vec<NotarizationEntry> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next().await {
            entries.push(entry);
        }
        entries
    }

    /// Release the subscription. Further calls to `next` return `None`.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.events.close();
            self.handle.transport().unsubscribe(&self.id);
        }
    }
}

impl Drop for EntryStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Decode an `Entry` event, stripping the ledger prefix from the digest.
fn entry_from_event(event: &LedgerEvent) -> Option<NotarizationEntry> {
    if event.event != ENTRY_EVENT {
        return None;
    }
    let signer = event.arg(SIGNER_KEY)?;
    let document_hash = DocumentDigest::parse(event.arg(DOCUMENT_HASH_KEY)?).ok()?;
    Some(NotarizationEntry {
        signer: SignerIdentity::from(signer),
        document_hash,
        block_number: event.block_number,
        log_index: event.log_index,
        tx_hash: event.tx_hash,
    })
}
