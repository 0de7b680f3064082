//! Instrumented transports for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use notary_ledger::{
    DevLedger, EventQuery, EventRange, LedgerTransport, Subscription, SubscriptionId,
    TransactionRequest, TransportError, TransportResult,
};
use notary_types::{SignerIdentity, StoreAddress, TxHash};

/// Wraps a [`DevLedger`], counting store resolutions and optionally slowing
/// them down, failing the first few, or refusing constrained filters.
pub struct CountingTransport {
    pub ledger: DevLedger,
    resolutions: AtomicUsize,
    failures_left: AtomicUsize,
    resolve_delay: Duration,
    reject_filters: bool,
}

impl CountingTransport {
    pub fn new(ledger: DevLedger) -> Self {
        Self {
            ledger,
            resolutions: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            resolve_delay: Duration::ZERO,
            reject_filters: false,
        }
    }

    pub fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = delay;
        self
    }

    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn rejecting_filters(mut self) -> Self {
        self.reject_filters = true;
        self
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerTransport for CountingTransport {
    async fn probe(&self) -> TransportResult<()> {
        self.ledger.probe().await
    }

    async fn default_account(&self) -> TransportResult<Option<SignerIdentity>> {
        self.ledger.default_account().await
    }

    async fn resolve_deployed(&self, store_name: &str) -> TransportResult<StoreAddress> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        if !self.resolve_delay.is_zero() {
            tokio::time::sleep(self.resolve_delay).await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::Unavailable("resolution timed out".into()));
        }
        self.ledger.resolve_deployed(store_name).await
    }

    async fn block_number(&self) -> TransportResult<u64> {
        self.ledger.block_number().await
    }

    async fn send_transaction(&self, request: TransactionRequest) -> TransportResult<TxHash> {
        self.ledger.send_transaction(request).await
    }

    async fn subscribe(
        &self,
        address: &StoreAddress,
        query: EventQuery,
        range: EventRange,
    ) -> TransportResult<Subscription> {
        if self.reject_filters && !query.is_unconstrained() {
            return Err(TransportError::FilterRejected("indexed filters not supported".into()));
        }
        self.ledger.subscribe(address, query, range).await
    }

    fn unsubscribe(&self, id: &SubscriptionId) {
        self.ledger.unsubscribe(id)
    }
}
