use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use notary_ledger::SubscriptionId;
use notary_types::NotarizationEntry;

use crate::connection::StoreHandle;
use crate::error::NotaryResult;
use crate::filter::SearchFilter;
use crate::search::EntrySearcher;

/// Lifecycle of a [`SearchSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    /// Building the query and opening the subscription.
    Filtering,
    /// Receiving history, then live entries.
    Subscribed,
    /// The stream ended, failed or was cancelled. Results are kept.
    Closed,
}

#[derive(Debug)]
struct SessionView {
    generation: u64,
    state: SearchState,
    results: Vec<NotarizationEntry>,
}

/// Closes a generation left in `Filtering`, i.e. a [`SearchSession::search`]
/// call dropped before its subscription opened.
struct OpeningGuard {
    view: Arc<watch::Sender<SessionView>>,
    generation: u64,
}

impl Drop for OpeningGuard {
    fn drop(&mut self) {
        let closed = self.view.send_if_modified(|view| {
            if view.generation != self.generation || view.state != SearchState::Filtering {
                return false;
            }
            view.state = SearchState::Closed;
            true
        });
        if closed {
            debug!(generation = self.generation, "search abandoned while opening");
        }
    }
}

struct ActiveSearch {
    pump: JoinHandle<()>,
    subscription: SubscriptionId,
    handle: Arc<StoreHandle>,
}

/// The caller's running search and its accumulated results.
///
/// Results only grow, in arrival order, until the next [`search`](Self::search)
/// clears them and replaces the previous subscription. Each search bumps a
/// generation number; entries from an older generation are never recorded.
pub struct SearchSession {
    searcher: EntrySearcher,
    view: Arc<watch::Sender<SessionView>>,
    active: Option<ActiveSearch>,
}

impl SearchSession {
    pub fn new(searcher: EntrySearcher) -> Self {
        let (view, _) = watch::channel(SessionView {
            generation: 0,
            state: SearchState::Idle,
            results: Vec::new(),
        });
        Self {
            searcher,
            view: Arc::new(view),
            active: None,
        }
    }

    /// Start a new search, tearing down the previous one first.
    ///
    /// Returns once the subscription is open; entries keep arriving in the
    /// background. On error the session is left `Closed` with no results.
    pub async fn search(&mut self, filter: &SearchFilter) -> NotaryResult<()> {
        self.teardown();

        let mut generation = 0;
        self.view.send_modify(|view| {
            view.generation += 1;
            view.state = SearchState::Filtering;
            view.results.clear();
            generation = view.generation;
        });
        let _opening = OpeningGuard {
            view: Arc::clone(&self.view),
            generation,
        };

        let mut stream = match self.searcher.open(filter).await {
            Ok(stream) => stream,
            Err(e) => {
                self.set_state(generation, SearchState::Closed);
                return Err(e);
            }
        };
        self.set_state(generation, SearchState::Subscribed);
        info!(generation, "search started");

        let subscription = stream.id();
        let handle = Arc::clone(stream.handle());
        let view = Arc::clone(&self.view);
        let pump = tokio::spawn(async move {
            while let Some(entry) = stream.next().await {
                let current = view.send_if_modified(|v| {
                    if v.generation != generation {
                        return false;
                    }
                    v.results.push(entry);
                    true
                });
                if !current {
                    return;
                }
            }
            view.send_if_modified(|v| {
                if v.generation != generation {
                    return false;
                }
                v.state = SearchState::Closed;
                true
            });
            debug!(generation, "search stream closed");
        });

        self.active = Some(ActiveSearch {
            pump,
            subscription,
            handle,
        });
        Ok(())
    }

    /// Snapshot of the results accumulated so far.
    pub fn results(&self) -> Vec<NotarizationEntry> {
        self.view.borrow().results.clone()
    }

    pub fn len(&self) -> usize {
        self.view.borrow().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> SearchState {
        self.view.borrow().state
    }

    /// Wait until at least `n` results have accumulated or the search has
    /// closed, and return the results at that point.
    pub async fn wait_for_len(&self, n: usize) -> Vec<NotarizationEntry> {
        let mut rx = self.view.subscribe();
        let results = match rx
            .wait_for(|v| v.results.len() >= n || v.state == SearchState::Closed)
            .await
        {
            Ok(view) => view.results.clone(),
            Err(_) => self.results(),
        };
        results
    }

    /// Stop the running search. Results are kept.
    pub fn cancel(&mut self) {
        self.teardown();
        self.view.send_modify(|view| {
            view.generation += 1;
            if view.state != SearchState::Idle {
                view.state = SearchState::Closed;
            }
        });
    }

    fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.pump.abort();
            active.handle.transport().unsubscribe(&active.subscription);
            debug!(id = %active.subscription, "previous search released");
        }
    }

    fn set_state(&self, generation: u64, state: SearchState) {
        self.view.send_if_modified(|view| {
            if view.generation != generation {
                return false;
            }
            view.state = state;
            true
        });
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
