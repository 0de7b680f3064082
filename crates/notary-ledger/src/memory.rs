use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use notary_types::{Bytes32, SignerIdentity, StoreAddress, TxHash};

use crate::config::DevLedgerConfig;
use crate::error::{TransportError, TransportResult};
use crate::event::{
    EventQuery, EventRange, LedgerEvent, Subscription, SubscriptionId, DOCUMENT_HASH_KEY,
    ENTRY_EVENT, SIGNER_KEY,
};
use crate::persist::{write_atomic, SaveLock};
use crate::transaction::{StoreCall, TransactionRequest};
use crate::transport::LedgerTransport;

/// Arguments of the `Entry` event that can be filtered on.
const INDEXED_ENTRY_ARGS: [&str; 2] = [SIGNER_KEY, DOCUMENT_HASH_KEY];

/// Persistent part of the dev ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub head: u64,
    pub nonce: u64,
    pub stores: BTreeMap<String, StoreAddress>,
    pub events: Vec<LedgerEvent>,
}

impl LedgerSnapshot {
    pub fn load(path: &Path) -> TransportResult<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Serialization(e.to_string()))
    }
}

/// A live subscriber: a filter and block window paired with a channel sender.
struct Subscriber {
    id: SubscriptionId,
    address: StoreAddress,
    query: EventQuery,
    from: u64,
    /// Last block to deliver; `None` follows the chain indefinitely.
    to: Option<u64>,
    sender: mpsc::UnboundedSender<LedgerEvent>,
}

#[derive(Default)]
struct LedgerState {
    chain: LedgerSnapshot,
    /// Head of the persisted file this copy was loaded from or last saved to.
    base_head: u64,
    subscribers: Vec<Subscriber>,
}

impl LedgerState {
    /// Deliver an event to all matching subscribers.
    ///
    /// Subscribers whose receivers are gone are pruned, as are bounded ones
    /// once the chain reaches their last block.
    fn route(&mut self, event: &LedgerEvent) {
        let block = event.block_number;
        self.subscribers.retain(|sub| {
            if sub.to.is_some_and(|to| block > to) {
                return false;
            }
            let open = if block >= sub.from
                && sub.address == event.address
                && sub.query.matches(event)
            {
                sub.sender.send(event.clone()).is_ok()
            } else {
                !sub.sender.is_closed()
            };
            open && sub.to.map_or(true, |to| block < to)
        });
    }
}

/// In-process ledger hosting notary stores, for tests and local demos.
///
/// Every accepted write is mined into its own block and emits one `Entry`
/// event. Subscriptions replay history and register for live events under
/// the same lock, so a subscriber never misses or repeats an event.
pub struct DevLedger {
    config: DevLedgerConfig,
    connected: AtomicBool,
    inner: RwLock<LedgerState>,
}

impl DevLedger {
    /// Start an empty ledger with the configured stores deployed.
    pub fn new(config: DevLedgerConfig) -> Self {
        let mut chain = LedgerSnapshot::default();
        for name in &config.stores {
            chain.stores.insert(name.clone(), store_address(name));
        }
        Self::restore(config, chain)
    }

    /// Rebuild a ledger from a snapshot. Configured stores missing from the
    /// snapshot are deployed.
    pub fn restore(config: DevLedgerConfig, mut chain: LedgerSnapshot) -> Self {
        for name in &config.stores {
            chain
                .stores
                .entry(name.clone())
                .or_insert_with(|| store_address(name));
        }
        Self {
            config,
            connected: AtomicBool::new(true),
            inner: RwLock::new(LedgerState {
                base_head: chain.head,
                chain,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Open the ledger persisted at `path`, or start a fresh one.
    pub fn load(path: &Path, config: DevLedgerConfig) -> TransportResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "starting new dev ledger");
            return Ok(Self::new(config));
        }
        let chain = LedgerSnapshot::load(path)?;
        info!(path = %path.display(), head = chain.head, "dev ledger loaded");
        Ok(Self::restore(config, chain))
    }

    /// Persist the chain to `path`.
    ///
    /// Fails with [`TransportError::Conflict`] if the file no longer holds
    /// the chain this copy was loaded from, i.e. another writer saved in
    /// between. The file is replaced atomically under an exclusive lock.
    pub fn save(&self, path: &Path) -> TransportResult<()> {
        let _lock = SaveLock::acquire(path)?;
        let (chain, base_head) = {
            let state = self
                .inner
                .read()
                .map_err(|_| TransportError::Internal("ledger lock poisoned".into()))?;
            (state.chain.clone(), state.base_head)
        };

        if path.exists() {
            let disk_head = LedgerSnapshot::load(path)?.head;
            if disk_head != base_head {
                return Err(TransportError::Conflict(format!(
                    "{} is at block {disk_head}, this copy was loaded at block {base_head}",
                    path.display()
                )));
            }
        }

        let bytes = serde_json::to_vec_pretty(&chain)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;
        write_atomic(path, &bytes)?;
        self.write_state()?.base_head = chain.head;
        debug!(path = %path.display(), head = chain.head, "dev ledger saved");
        Ok(())
    }

    pub fn snapshot(&self) -> TransportResult<LedgerSnapshot> {
        let state = self
            .inner
            .read()
            .map_err(|_| TransportError::Internal("ledger lock poisoned".into()))?;
        Ok(state.chain.clone())
    }

    pub fn config(&self) -> &DevLedgerConfig {
        &self.config
    }

    /// Deploy a store by name (idempotent) and return its address.
    pub fn deploy(&self, name: &str) -> TransportResult<StoreAddress> {
        let mut state = self.write_state()?;
        let address = state
            .chain
            .stores
            .entry(name.to_string())
            .or_insert_with(|| store_address(name))
            .clone();
        Ok(address)
    }

    /// Append a raw event in a new block, bypassing the store's write
    /// policy. Used to simulate foreign or malformed logs.
    pub fn inject_event(
        &self,
        address: &StoreAddress,
        event: &str,
        args: BTreeMap<String, String>,
    ) -> TransportResult<LedgerEvent> {
        let mut state = self.write_state()?;
        state.chain.nonce += 1;
        state.chain.head += 1;
        let tx_hash = tx_hash(state.chain.nonce, address, event.as_bytes());
        let event = LedgerEvent {
            event: event.to_string(),
            address: address.clone(),
            block_number: state.chain.head,
            log_index: 0,
            tx_hash,
            args,
        };
        state.chain.events.push(event.clone());
        state.route(&event);
        Ok(event)
    }

    /// Append the blocks a newer copy of this chain has beyond our head,
    /// delivering their events to live subscribers. Returns the number of
    /// events added.
    pub fn absorb(&self, newer: LedgerSnapshot) -> TransportResult<usize> {
        let mut state = self.write_state()?;
        let head = state.chain.head;
        if newer.head <= head {
            return Ok(0);
        }
        for (name, address) in newer.stores {
            state.chain.stores.entry(name).or_insert(address);
        }
        // Without unsaved local blocks this copy now matches the newer file.
        if state.base_head == head {
            state.base_head = newer.head;
        }
        state.chain.head = newer.head;
        state.chain.nonce = state.chain.nonce.max(newer.nonce);

        let mut added = 0;
        for event in newer.events.into_iter().filter(|e| e.block_number > head) {
            state.route(&event);
            state.chain.events.push(event);
            added += 1;
        }
        debug!(from = head, to = newer.head, added, "absorbed newer blocks");
        Ok(added)
    }

    /// Simulate a dropped transport: live subscriptions end and every call
    /// fails until [`reconnect`](Self::reconnect).
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        if let Ok(mut state) = self.inner.write() {
            state.subscribers.clear();
        }
        info!("dev ledger disconnected");
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        info!("dev ledger reconnected");
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .read()
            .map(|state| state.subscribers.iter().filter(|s| !s.sender.is_closed()).count())
            .unwrap_or(0)
    }

    /// Number of events on the ledger.
    pub fn event_count(&self) -> usize {
        self.inner
            .read()
            .map(|state| state.chain.events.len())
            .unwrap_or(0)
    }

    fn ensure_connected(&self) -> TransportResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::Unavailable("dev ledger disconnected".into()))
        }
    }

    fn write_state(&self) -> TransportResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner
            .write()
            .map_err(|_| TransportError::Internal("ledger lock poisoned".into()))
    }

    fn validate_query(query: &EventQuery) -> TransportResult<()> {
        if let Some(ref name) = query.event {
            if name != ENTRY_EVENT {
                return Err(TransportError::FilterRejected(format!("unknown event {name:?}")));
            }
        }
        for (key, value) in &query.conditions {
            if !INDEXED_ENTRY_ARGS.contains(&key.as_str()) {
                return Err(TransportError::FilterRejected(format!(
                    "{key:?} is not an indexed argument"
                )));
            }
            if key == DOCUMENT_HASH_KEY {
                Bytes32::parse_prefixed(value).map_err(|e| {
                    TransportError::FilterRejected(format!("{DOCUMENT_HASH_KEY}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

impl Default for DevLedger {
    fn default() -> Self {
        Self::new(DevLedgerConfig::default())
    }
}

#[async_trait]
impl LedgerTransport for DevLedger {
    async fn probe(&self) -> TransportResult<()> {
        self.ensure_connected()
    }

    async fn default_account(&self) -> TransportResult<Option<SignerIdentity>> {
        self.ensure_connected()?;
        Ok(self.config.accounts.first().cloned())
    }

    async fn resolve_deployed(&self, store_name: &str) -> TransportResult<StoreAddress> {
        self.ensure_connected()?;
        let state = self
            .inner
            .read()
            .map_err(|_| TransportError::Internal("ledger lock poisoned".into()))?;
        state
            .chain
            .stores
            .get(store_name)
            .cloned()
            .ok_or_else(|| TransportError::NotDeployed(store_name.to_string()))
    }

    async fn block_number(&self) -> TransportResult<u64> {
        self.ensure_connected()?;
        let state = self
            .inner
            .read()
            .map_err(|_| TransportError::Internal("ledger lock poisoned".into()))?;
        Ok(state.chain.head)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> TransportResult<TxHash> {
        self.ensure_connected()?;
        let StoreCall::Create { document_hash } = &request.call;

        if request.from.is_empty() {
            return Err(TransportError::Rejected("missing sender".into()));
        }
        if request.value < self.config.min_fee {
            return Err(TransportError::Rejected(format!(
                "insufficient fee: sent {}, store requires {}",
                request.value, self.config.min_fee
            )));
        }

        let mut state = self.write_state()?;
        if !state.chain.stores.values().any(|a| a == &request.to) {
            return Err(TransportError::Rejected(format!(
                "no store deployed at {}",
                request.to
            )));
        }

        state.chain.nonce += 1;
        state.chain.head += 1;
        let tx_hash = tx_hash(state.chain.nonce, &request.to, document_hash.as_bytes());

        let mut args = BTreeMap::new();
        args.insert(SIGNER_KEY.to_string(), request.from.as_str().to_string());
        args.insert(DOCUMENT_HASH_KEY.to_string(), document_hash.to_prefixed_hex());
        let event = LedgerEvent {
            event: ENTRY_EVENT.to_string(),
            address: request.to.clone(),
            block_number: state.chain.head,
            log_index: 0,
            tx_hash,
            args,
        };
        state.chain.events.push(event.clone());
        state.route(&event);

        info!(
            tx = %tx_hash.short_hex(),
            block = state.chain.head,
            method = request.call.method(),
            "transaction mined"
        );
        Ok(tx_hash)
    }

    async fn subscribe(
        &self,
        address: &StoreAddress,
        query: EventQuery,
        range: EventRange,
    ) -> TransportResult<Subscription> {
        self.ensure_connected()?;
        Self::validate_query(&query)?;

        let mut state = self.write_state()?;
        if !state.chain.stores.values().any(|a| a == address) {
            return Err(TransportError::NotDeployed(address.to_string()));
        }

        let id = SubscriptionId::new();
        let (sender, events) = mpsc::unbounded_channel();
        let head = state.chain.head;
        let (from, to) = range.bounds(head);
        let replayed = state
            .chain
            .events
            .iter()
            .filter(|e| &e.address == address && query.matches(e))
            .filter(|e| range.contains(e.block_number, head))
            .map(|e| sender.send(e.clone()))
            .take_while(Result::is_ok)
            .count();

        // Bounded ranges reaching past the head stay registered until the
        // chain gets there.
        let live = to.map_or(true, |to| to > head);
        if live {
            state.subscribers.push(Subscriber {
                id,
                address: address.clone(),
                query,
                from,
                to,
                sender,
            });
        }
        debug!(%id, replayed, live, "subscription opened");
        Ok(Subscription { id, events })
    }

    fn unsubscribe(&self, id: &SubscriptionId) {
        if let Ok(mut state) = self.inner.write() {
            let before = state.subscribers.len();
            state.subscribers.retain(|sub| &sub.id != id);
            if state.subscribers.len() < before {
                debug!(%id, "subscription released");
            }
        }
    }
}

/// Deterministic store address: first 20 bytes of a domain-separated BLAKE3
/// hash of the store name.
fn store_address(name: &str) -> StoreAddress {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"notary-store-v1:");
    hasher.update(name.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[..20]);
    StoreAddress::from_bytes(bytes)
}

fn tx_hash(nonce: u64, to: &StoreAddress, data: &[u8]) -> TxHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"notary-tx-v1:");
    hasher.update(&nonce.to_be_bytes());
    hasher.update(to.as_str().as_bytes());
    hasher.update(data);
    TxHash::from_hash(*hasher.finalize().as_bytes())
}
