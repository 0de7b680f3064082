use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use notary_types::{StoreAddress, TxHash};

/// Event emitted by the notary store for every accepted write.
pub const ENTRY_EVENT: &str = "Entry";
/// Indexed `Entry` argument holding the signer identity.
pub const SIGNER_KEY: &str = "signer";
/// Indexed `Entry` argument holding the `0x`-prefixed document digest.
pub const DOCUMENT_HASH_KEY: &str = "documentHash";

/// A log record emitted by a store, in ledger order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Event name, e.g. [`ENTRY_EVENT`].
    pub event: String,
    /// Store that emitted the event.
    pub address: StoreAddress,
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: TxHash,
    /// Event arguments as the ledger renders them (byte-strings keep their `0x`).
    pub args: BTreeMap<String, String>,
}

impl LedgerEvent {
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
}

/// Key-based filter over a store's event log.
///
/// An empty condition set matches every event of the named kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    /// If set, only events with this name are delivered.
    pub event: Option<String>,
    /// Exact-match constraints on event arguments.
    pub conditions: BTreeMap<String, String>,
}

impl EventQuery {
    /// Match every event with the given name.
    pub fn for_event(name: impl Into<String>) -> Self {
        Self {
            event: Some(name.into()),
            conditions: BTreeMap::new(),
        }
    }

    /// Add an exact-match constraint.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The same query with every argument constraint dropped.
    pub fn unconstrained(&self) -> Self {
        Self {
            event: self.event.clone(),
            conditions: BTreeMap::new(),
        }
    }

    /// Returns `true` if the given event matches this query.
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        if let Some(ref name) = self.event {
            if name != &event.event {
                return false;
            }
        }
        self.conditions
            .iter()
            .all(|(key, value)| event.arg(key) == Some(value.as_str()))
    }
}

/// A block position in a subscription range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockTag {
    /// The first block of the ledger.
    Genesis,
    Number(u64),
    /// The head of the ledger; as an upper bound, keeps following new blocks.
    Latest,
}

impl BlockTag {
    /// Concrete block number given the current head.
    pub fn resolve(&self, head: u64) -> u64 {
        match self {
            Self::Genesis => 0,
            Self::Number(n) => *n,
            Self::Latest => head,
        }
    }
}

/// Block range covered by a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRange {
    pub from: BlockTag,
    pub to: BlockTag,
}

impl EventRange {
    /// Replay from genesis, then follow the live tail indefinitely.
    pub const fn full() -> Self {
        Self {
            from: BlockTag::Genesis,
            to: BlockTag::Latest,
        }
    }

    /// Replay from genesis through block `n`, then end.
    pub const fn through(n: u64) -> Self {
        Self {
            from: BlockTag::Genesis,
            to: BlockTag::Number(n),
        }
    }

    /// `true` if the subscription keeps delivering new blocks.
    pub fn is_live(&self) -> bool {
        self.to == BlockTag::Latest
    }

    /// Concrete `(from, to)` block numbers given the head at subscribe time;
    /// `to` is `None` for an open-ended range.
    pub fn bounds(&self, head: u64) -> (u64, Option<u64>) {
        let to = match self.to {
            BlockTag::Latest => None,
            to => Some(to.resolve(head)),
        };
        (self.from.resolve(head), to)
    }

    /// Whether `block` falls in the range, given the head at subscribe time.
    pub fn contains(&self, block: u64, head: u64) -> bool {
        let (from, to) = self.bounds(head);
        block >= from && to.map_or(true, |to| block <= to)
    }
}

impl Default for EventRange {
    fn default() -> Self {
        Self::full()
    }
}

/// Identifier of an open subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

/// An open event subscription: history first, then live events.
///
/// The channel closes when the range is exhausted, the subscription is
/// released, or the transport drops.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<LedgerEvent>,
}
