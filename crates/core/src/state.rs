//! Shared search state: the committed query, filters, and scope read by
//! result views.
//!
//! One writer (the coordinator) stages fields through [`SearchSink`] and
//! publishes them with `trigger_search`. Readers only ever see whole
//! [`CommittedSearchRequest`] values; staged fields stay invisible until the
//! trigger replaces the previous request as one unit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::debug;

use crate::types::{CommittedSearchRequest, SearchScope, StructuredFilters};

/// Write side of the shared search state.
pub trait SearchSink: Send + Sync {
    fn set_query(&self, query: String);
    fn set_filters(&self, filters: StructuredFilters);
    fn set_scope(&self, scope: SearchScope);
    /// Publish the staged fields and fire the search event.
    fn trigger_search(&self);
}

#[derive(Default)]
struct Staged {
    query: String,
    filters: StructuredFilters,
    scope: SearchScope,
}

pub struct SharedSearchState {
    staged: Mutex<Staged>,
    committed: watch::Sender<Option<Arc<CommittedSearchRequest>>>,
    generation: AtomicU64,
}

impl Default for SharedSearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedSearchState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { staged: Mutex::new(Staged::default()), committed: tx, generation: AtomicU64::new(0) }
    }

    /// Current committed request, if any.
    pub fn current(&self) -> Option<Arc<CommittedSearchRequest>> {
        self.committed.borrow().clone()
    }

    pub fn query(&self) -> String {
        self.current().map(|r| r.query.clone()).unwrap_or_default()
    }

    pub fn filters(&self) -> StructuredFilters {
        self.current().map(|r| r.filters).unwrap_or_default()
    }

    pub fn scope(&self) -> SearchScope {
        self.current().map(|r| r.scope).unwrap_or_default()
    }

    /// Number of search events fired so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Receiver notified on every published request or clear.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<CommittedSearchRequest>>> {
        self.committed.subscribe()
    }

    /// Drop the committed request. Does not fire a search event.
    pub fn clear(&self) {
        *self.lock_staged() = Staged::default();
        self.committed.send_replace(None);
        debug!("Cleared committed search");
    }

    fn lock_staged(&self) -> std::sync::MutexGuard<'_, Staged> {
        self.staged.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SearchSink for SharedSearchState {
    fn set_query(&self, query: String) {
        self.lock_staged().query = query;
    }

    fn set_filters(&self, filters: StructuredFilters) {
        self.lock_staged().filters = filters;
    }

    fn set_scope(&self, scope: SearchScope) {
        self.lock_staged().scope = scope;
    }

    fn trigger_search(&self) {
        let request = {
            let staged = self.lock_staged();
            CommittedSearchRequest {
                query: staged.query.clone(),
                filters: staged.filters,
                scope: staged.scope,
            }
        };
        self.committed.send_replace(Some(Arc::new(request)));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Search triggered");
    }
}
