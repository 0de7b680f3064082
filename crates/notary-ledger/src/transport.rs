use async_trait::async_trait;

use notary_types::{SignerIdentity, StoreAddress, TxHash};

use crate::error::TransportResult;
use crate::event::{EventQuery, EventRange, Subscription, SubscriptionId};
use crate::transaction::TransactionRequest;

/// Connectivity to a ledger that hosts the notary store.
///
/// Treated as a black box: any call may fail or never complete. The client
/// does not retry on its own.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Check that the ledger is reachable.
    async fn probe(&self) -> TransportResult<()>;

    /// Ambient signer identity used as the default transaction origin.
    async fn default_account(&self) -> TransportResult<Option<SignerIdentity>>;

    /// Look up the on-ledger address of a deployed store.
    async fn resolve_deployed(&self, store_name: &str) -> TransportResult<StoreAddress>;

    /// Current head block number.
    async fn block_number(&self) -> TransportResult<u64>;

    /// Submit a write. Returns once the ledger has accepted it, not once it
    /// is final.
    async fn send_transaction(&self, request: TransactionRequest) -> TransportResult<TxHash>;

    /// Open a subscription over a store's event log.
    async fn subscribe(
        &self,
        address: &StoreAddress,
        query: EventQuery,
        range: EventRange,
    ) -> TransportResult<Subscription>;

    /// Release a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: &SubscriptionId);
}
