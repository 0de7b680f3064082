use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use notary_ledger::LedgerTransport;
use notary_types::{SignerIdentity, StoreAddress};

use crate::config::NotaryConfig;
use crate::error::{NotaryError, NotaryResult};

/// A resolved connection to the deployed notary store.
///
/// Read-only once built; shared between writers and searches.
pub struct StoreHandle {
    store_name: String,
    address: StoreAddress,
    default_origin: Option<SignerIdentity>,
    transport: Arc<dyn LedgerTransport>,
}

impl StoreHandle {
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn address(&self) -> &StoreAddress {
        &self.address
    }

    /// Origin used for writes that do not name a signer.
    pub fn default_origin(&self) -> Option<&SignerIdentity> {
        self.default_origin.as_ref()
    }

    pub fn transport(&self) -> &Arc<dyn LedgerTransport> {
        &self.transport
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("store_name", &self.store_name)
            .field("address", &self.address)
            .field("default_origin", &self.default_origin)
            .finish_non_exhaustive()
    }
}

/// Resolves the store handle at most once at a time and caches the result.
///
/// Concurrent callers of [`handle`](Self::handle) share a single in-flight
/// resolution. A failed resolution is not cached; the next call starts over.
pub struct StoreConnector {
    transport: Option<Arc<dyn LedgerTransport>>,
    store_name: String,
    default_signer: Option<SignerIdentity>,
    handle: OnceCell<Arc<StoreHandle>>,
    resolutions: AtomicUsize,
    unavailable_reported: AtomicBool,
}

impl StoreConnector {
    pub fn new(transport: Arc<dyn LedgerTransport>, config: &NotaryConfig) -> Self {
        Self::build(Some(transport), config)
    }

    /// A connector with no ambient transport. Every call fails with
    /// [`NotaryError::TransportUnavailable`].
    pub fn detached(config: &NotaryConfig) -> Self {
        Self::build(None, config)
    }

    fn build(transport: Option<Arc<dyn LedgerTransport>>, config: &NotaryConfig) -> Self {
        Self {
            transport,
            store_name: config.store_name.clone(),
            default_signer: config.default_signer.clone().filter(|s| !s.is_empty()),
            handle: OnceCell::new(),
            resolutions: AtomicUsize::new(0),
            unavailable_reported: AtomicBool::new(false),
        }
    }

    /// The resolved store handle, resolving it on first use.
    pub async fn handle(&self) -> NotaryResult<Arc<StoreHandle>> {
        if let Some(handle) = self.handle.get() {
            return Ok(Arc::clone(handle));
        }
        let handle = self.handle.get_or_try_init(|| self.resolve()).await?;
        Ok(Arc::clone(handle))
    }

    pub fn is_resolved(&self) -> bool {
        self.handle.initialized()
    }

    /// Number of store lookups started so far.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    async fn resolve(&self) -> NotaryResult<Arc<StoreHandle>> {
        let transport = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => return Err(self.unavailable("no ledger transport configured".into())),
        };
        if let Err(e) = transport.probe().await {
            return Err(self.unavailable(e.to_string()));
        }

        let attempt = self.resolutions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(store = %self.store_name, attempt, "resolving store");

        let default_origin = match &self.default_signer {
            Some(signer) => Some(signer.clone()),
            None => transport.default_account().await?,
        };
        let address = transport.resolve_deployed(&self.store_name).await?;

        info!(store = %self.store_name, %address, "store resolved");
        Ok(Arc::new(StoreHandle {
            store_name: self.store_name.clone(),
            address,
            default_origin,
            transport,
        }))
    }

    fn unavailable(&self, reason: String) -> NotaryError {
        if !self.unavailable_reported.swap(true, Ordering::SeqCst) {
            error!(%reason, "ledger transport unavailable; ledger operations will fail until it is reachable");
        }
        NotaryError::TransportUnavailable(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use notary_ledger::DevLedger;

    use crate::testing::CountingTransport;

    fn connector(transport: &Arc<CountingTransport>) -> StoreConnector {
        StoreConnector::new(transport.clone(), &NotaryConfig::default())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_resolution() {
        let transport = Arc::new(
            CountingTransport::new(DevLedger::default())
                .with_resolve_delay(Duration::from_millis(50)),
        );
        let connector = Arc::new(connector(&transport));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let connector = Arc::clone(&connector);
                tokio::spawn(async move { connector.handle().await })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(transport.resolutions(), 1);
        assert_eq!(connector.resolution_count(), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
    }

    #[tokio::test]
    async fn cached_handle_is_reused() {
        let transport = Arc::new(CountingTransport::new(DevLedger::default()));
        let connector = connector(&transport);
        assert!(!connector.is_resolved());

        let first = connector.handle().await.unwrap();
        let second = connector.handle().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(connector.is_resolved());
        assert_eq!(transport.resolutions(), 1);
    }

    #[tokio::test]
    async fn failed_resolution_is_not_cached() {
        let transport = Arc::new(CountingTransport::new(DevLedger::default()).failing_first(1));
        let connector = connector(&transport);

        let err = connector.handle().await.unwrap_err();
        assert!(matches!(err, NotaryError::TransportUnavailable(_)));
        assert!(!connector.is_resolved());

        let handle = connector.handle().await.unwrap();
        assert_eq!(handle.store_name(), "NotaryStore");
        assert_eq!(transport.resolutions(), 2);
    }

    #[tokio::test]
    async fn missing_transport_is_unavailable() {
        let connector = StoreConnector::detached(&NotaryConfig::default());
        for _ in 0..2 {
            let err = connector.handle().await.unwrap_err();
            assert!(matches!(err, NotaryError::TransportUnavailable(_)));
        }
        assert_eq!(connector.resolution_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_transport_fails_before_resolution() {
        let transport = Arc::new(CountingTransport::new(DevLedger::default()));
        transport.ledger.disconnect();
        let connector = connector(&transport);

        let err = connector.handle().await.unwrap_err();
        assert!(matches!(err, NotaryError::TransportUnavailable(_)));
        assert_eq!(transport.resolutions(), 0);

        transport.ledger.reconnect();
        assert!(connector.handle().await.is_ok());
    }

    #[tokio::test]
    async fn undeployed_store_is_reported() {
        let transport = Arc::new(CountingTransport::new(DevLedger::default()));
        let config = NotaryConfig {
            store_name: "Elsewhere".into(),
            ..NotaryConfig::default()
        };
        let connector = StoreConnector::new(transport, &config);
        let err = connector.handle().await.unwrap_err();
        assert!(matches!(err, NotaryError::StoreNotDeployed(_)));
    }

    #[tokio::test]
    async fn configured_signer_overrides_ambient_account() {
        let transport = Arc::new(CountingTransport::new(DevLedger::default()));
        let config = NotaryConfig {
            default_signer: Some(SignerIdentity::from("0xFEED")),
            ..NotaryConfig::default()
        };
        let handle = StoreConnector::new(transport, &config).handle().await.unwrap();
        assert_eq!(handle.default_origin(), Some(&SignerIdentity::from("0xFEED")));
    }
}
