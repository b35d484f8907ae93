//! Search commit coordinator: owns the overlay lifecycle, the draft, and the
//! debounced query, and turns a commit into one published search request
//! plus a routed, concrete scope.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{CatalogProvider, CatalogSnapshot, PriceBounds};
use crate::debounce::Debouncer;
use crate::draft::{DraftCommand, DraftState};
use crate::state::SearchSink;
use crate::types::{EffectiveScope, ReseedPolicy, SearchConfig, SearchScope};

/// Receives the routed scope once per commit.
pub type SearchRouter = Box<dyn FnMut(EffectiveScope) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    Closed,
    Open,
}

/// Resolve the scope a commit routes to.
///
/// An explicit `Products` or `Certificates` is used as is. `All` has no result
/// view, so it is inferred from the query: anything containing "cert"
/// (case-insensitive) routes to certificates, everything else to products.
pub fn resolve_effective_scope(explicit: SearchScope, query: &str) -> EffectiveScope {
    match explicit {
        SearchScope::Products => EffectiveScope::Products,
        SearchScope::Certificates => EffectiveScope::Certificates,
        SearchScope::All => {
            if query.to_lowercase().contains("cert") {
                EffectiveScope::Certificates
            } else {
                EffectiveScope::Products
            }
        }
    }
}

pub struct SearchCoordinator {
    panel: PanelState,
    draft: DraftState,
    query: Debouncer<String>,
    bounds: PriceBounds,
    fallback: PriceBounds,
    policy: ReseedPolicy,
    sink: Arc<dyn SearchSink>,
    router: Option<SearchRouter>,
}

impl SearchCoordinator {
    pub fn new(sink: Arc<dyn SearchSink>, config: &SearchConfig) -> Self {
        let bounds = config.fallback_bounds;
        Self {
            panel: PanelState::Closed,
            draft: DraftState::seeded(bounds),
            query: Debouncer::new(String::new(), config.debounce),
            bounds,
            fallback: config.fallback_bounds,
            policy: config.reseed_policy,
            sink,
            router: None,
        }
    }

    pub fn with_router(mut self, router: impl FnMut(EffectiveScope) + Send + 'static) -> Self {
        self.router = Some(Box::new(router));
        self
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn is_open(&self) -> bool {
        self.panel == PanelState::Open
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    pub fn bounds(&self) -> PriceBounds {
        self.bounds
    }

    /// Last stabilized query text.
    pub fn debounced_query(&self) -> String {
        self.query.stable()
    }

    /// Quiet period before a typed query counts as settled.
    pub fn debounce_delay(&self) -> Duration {
        self.query.delay()
    }

    pub fn subscribe_query(&self) -> tokio::sync::watch::Receiver<String> {
        self.query.subscribe()
    }

    /// Closed -> Open with a fresh draft seeded from the current bounds.
    /// Opening an already open panel keeps the in-progress draft.
    pub fn open(&mut self) {
        if self.is_open() {
            return;
        }
        self.draft = DraftState::seeded(self.bounds);
        self.query.reset(String::new());
        self.panel = PanelState::Open;
        debug!(min = self.bounds.min, max = self.bounds.max, "Search panel opened");
    }

    /// Open -> Closed without searching. Returns false if already closed.
    pub fn cancel(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.close();
        debug!("Search panel cancelled, draft discarded");
        true
    }

    /// Recompute bounds from a new catalog snapshot; the draft is re-seeded
    /// only when the bounds actually change.
    pub fn set_catalog(&mut self, snapshot: &CatalogSnapshot) {
        let bounds = PriceBounds::from_snapshot_or(snapshot, self.fallback);
        if bounds == self.bounds {
            return;
        }
        debug!(items = snapshot.len(), min = bounds.min, max = bounds.max, "Price bounds changed");
        self.bounds = bounds;
        self.draft.seed_bounds(bounds, self.policy);
    }

    pub fn refresh_catalog(&mut self, provider: &dyn CatalogProvider) {
        self.set_catalog(&provider.catalog_snapshot());
    }

    /// Apply one control interaction. Ignored while the panel is closed.
    /// Query edits also feed the debouncer.
    pub fn input(&mut self, command: DraftCommand) -> bool {
        if !self.is_open() {
            return false;
        }
        if let DraftCommand::SetQuery(text) = &command {
            self.query.update(text.clone());
        }
        self.draft.apply(command, self.bounds);
        true
    }

    /// Publish the draft as the committed search and close the panel.
    ///
    /// The published scope is the explicit selection; the returned (and routed)
    /// scope is the resolved one. The query is the last stabilized value, so a
    /// keystroke still inside the debounce window is not included. Returns
    /// `None` without side effects when the panel is closed.
    pub fn commit(&mut self) -> Option<EffectiveScope> {
        if !self.is_open() {
            return None;
        }

        let query = self.query.stable();
        let scope = self.draft.scope;
        let effective = resolve_effective_scope(scope, &query);
        if query != self.draft.query {
            debug!(raw = %self.draft.query, settled = %query, "Committing before query settled");
        }

        self.sink.set_query(query.clone());
        self.sink.set_filters(self.draft.filters);
        self.sink.set_scope(scope);
        self.sink.trigger_search();

        debug!(query = %query, scope = %scope, effective = %effective, "Search committed");

        if let Some(router) = self.router.as_mut() {
            router(effective);
        }
        self.close();
        Some(effective)
    }

    /// Reset the draft: empty query, seeded price range, no category or status,
    /// scope `All`. The committed search is left alone.
    pub fn clear(&mut self) {
        self.draft.reset(self.bounds);
        self.query.reset(String::new());
        debug!("Search draft cleared");
    }

    fn close(&mut self) {
        self.query.cancel();
        self.panel = PanelState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedSearchState;
    use crate::types::{CertStatus, ProductCategory, StructuredFilters};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    fn setup() -> (SearchCoordinator, Arc<SharedSearchState>, Arc<Mutex<Vec<EffectiveScope>>>) {
        let shared = Arc::new(SharedSearchState::new());
        let routed = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&routed);
        let coordinator = SearchCoordinator::new(shared.clone(), &SearchConfig::default())
            .with_router(move |scope| log.lock().unwrap().push(scope));
        (coordinator, shared, routed)
    }

    async fn type_and_settle(c: &mut SearchCoordinator, text: &str) {
        c.input(DraftCommand::SetQuery(text.to_string()));
        sleep(Duration::from_millis(350)).await;
    }

    #[test]
    fn explicit_scopes_are_never_inferred() {
        for query in ["certificate", "CERT", "organic snacks", ""] {
            assert_eq!(
                resolve_effective_scope(SearchScope::Certificates, query),
                EffectiveScope::Certificates
            );
            assert_eq!(resolve_effective_scope(SearchScope::Products, query), EffectiveScope::Products);
        }
    }

    #[test]
    fn all_scope_is_inferred_from_query() {
        assert_eq!(resolve_effective_scope(SearchScope::All, "HALAL CERT"), EffectiveScope::Certificates);
        assert_eq!(resolve_effective_scope(SearchScope::All, "Certified"), EffectiveScope::Certificates);
        assert_eq!(resolve_effective_scope(SearchScope::All, "organic snacks"), EffectiveScope::Products);
        assert_eq!(resolve_effective_scope(SearchScope::All, ""), EffectiveScope::Products);
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_commit() {
        let (mut c, shared, routed) = setup();
        c.set_catalog(&CatalogSnapshot::from_prices(&[5.0, 99.5, 250.0]));
        c.open();
        assert_eq!(c.draft().filters, StructuredFilters::with_price_range(5.0, 250.0));

        type_and_settle(&mut c, "halal cert").await;
        assert_eq!(c.debounced_query(), "halal cert");

        assert_eq!(c.commit(), Some(EffectiveScope::Certificates));
        let committed = shared.current().unwrap();
        assert_eq!(committed.query, "halal cert");
        assert_eq!(committed.scope, SearchScope::All);
        assert_eq!(committed.filters.min_price, Some(5.0));
        assert_eq!(committed.filters.max_price, Some(250.0));
        assert_eq!(*routed.lock().unwrap(), vec![EffectiveScope::Certificates]);
        assert_eq!(c.panel(), PanelState::Closed);
        assert_eq!(shared.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn query_subscribers_see_settled_values_only() {
        let (mut c, _, _) = setup();
        c.open();
        let mut rx = c.subscribe_query();
        c.input(DraftCommand::SetQuery("r".into()));
        c.input(DraftCommand::SetQuery("ros".into()));
        c.input(DraftCommand::SetQuery("rose water".into()));

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "rose water");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn query_input_outside_runtime_settles_at_once() {
        let (mut c, shared, _) = setup();
        c.open();
        assert!(c.input(DraftCommand::SetQuery("certificate".into())));
        assert_eq!(c.debounced_query(), "certificate");
        assert_eq!(c.commit(), Some(EffectiveScope::Certificates));
        assert_eq!(shared.query(), "certificate");
    }

    #[tokio::test(start_paused = true)]
    async fn published_scope_differs_from_routed_scope() {
        let (mut c, shared, _) = setup();
        c.open();
        type_and_settle(&mut c, "certificate").await;
        let routed = c.commit().unwrap();
        assert_eq!(shared.scope(), SearchScope::All);
        assert_eq!(routed, EffectiveScope::Certificates);
    }

    #[tokio::test(start_paused = true)]
    async fn commit_uses_last_settled_query() {
        let (mut c, shared, _) = setup();
        c.open();
        type_and_settle(&mut c, "olive").await;
        c.input(DraftCommand::SetQuery("olive cert".into()));
        sleep(Duration::from_millis(100)).await;

        assert_eq!(c.commit(), Some(EffectiveScope::Products));
        assert_eq!(shared.query(), "olive");

        // the cancelled timer must not leak into a later read
        sleep(Duration::from_millis(500)).await;
        assert_eq!(c.debounced_query(), "olive");
    }

    #[tokio::test(start_paused = true)]
    async fn commit_publishes_filters_verbatim() {
        let (mut c, shared, _) = setup();
        c.open();
        c.input(DraftCommand::SetCategory(ProductCategory::Food));
        c.input(DraftCommand::SetScope(SearchScope::Certificates));
        c.input(DraftCommand::SetCertStatus(CertStatus::Certified));
        c.commit();

        let committed = shared.current().unwrap();
        assert_eq!(committed.scope, SearchScope::Certificates);
        assert_eq!(committed.filters.category, Some(ProductCategory::Food));
        assert_eq!(committed.relevant_filters().category, None);
        assert_eq!(committed.relevant_filters().cert_status, Some(CertStatus::Certified));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_resets_draft_but_not_committed_state() {
        let (mut c, shared, _) = setup();
        c.set_catalog(&CatalogSnapshot::from_prices(&[12.3, 80.9]));
        c.open();
        type_and_settle(&mut c, "dates").await;
        c.commit();

        c.open();
        type_and_settle(&mut c, "soap").await;
        c.input(DraftCommand::SetScope(SearchScope::Products));
        c.input(DraftCommand::SetCategory(ProductCategory::Cosmetics));
        c.input(DraftCommand::SetPriceRange { min: 20.0, max: 30.0 });
        c.clear();

        assert_eq!(*c.draft(), DraftState::seeded(PriceBounds { min: 12.0, max: 81.0 }));
        assert_eq!(c.debounced_query(), "");
        assert!(c.is_open());
        assert_eq!(shared.query(), "dates");
        assert_eq!(shared.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_draft_without_search() {
        let (mut c, shared, routed) = setup();
        c.open();
        c.input(DraftCommand::SetQuery("argan".into()));
        assert!(c.cancel());
        assert!(!c.cancel());

        sleep(Duration::from_millis(500)).await;
        assert!(shared.current().is_none());
        assert!(routed.lock().unwrap().is_empty());

        c.open();
        assert_eq!(c.draft().query, "");
        assert_eq!(c.debounced_query(), "");
    }

    #[test]
    fn closed_panel_ignores_input_and_commit() {
        let (mut c, shared, routed) = setup();
        assert!(!c.input(DraftCommand::SetScope(SearchScope::Products)));
        assert_eq!(c.commit(), None);
        assert!(shared.current().is_none());
        assert!(routed.lock().unwrap().is_empty());
    }

    #[test]
    fn reopening_an_open_panel_keeps_draft() {
        let (mut c, _, _) = setup();
        c.open();
        c.input(DraftCommand::SetScope(SearchScope::Certificates));
        c.open();
        assert_eq!(c.draft().scope, SearchScope::Certificates);
    }

    #[test]
    fn unchanged_catalog_keeps_user_range() {
        let (mut c, _, _) = setup();
        let catalog = CatalogSnapshot::from_prices(&[5.0, 250.0]);
        c.set_catalog(&catalog);
        c.open();
        c.input(DraftCommand::SetPriceRange { min: 40.0, max: 60.0 });

        c.refresh_catalog(&catalog);
        assert_eq!(c.draft().filters.min_price, Some(40.0));
        assert_eq!(c.draft().filters.max_price, Some(60.0));
    }

    #[test]
    fn always_policy_reseeds_on_catalog_change() {
        let config = SearchConfig { reseed_policy: ReseedPolicy::Always, ..SearchConfig::default() };
        let mut c = SearchCoordinator::new(Arc::new(SharedSearchState::new()), &config);
        c.set_catalog(&CatalogSnapshot::from_prices(&[5.0, 250.0]));
        c.open();
        c.input(DraftCommand::SetPriceRange { min: 40.0, max: 60.0 });

        c.set_catalog(&CatalogSnapshot::from_prices(&[2.2, 310.4]));
        assert_eq!(c.bounds(), PriceBounds { min: 2.0, max: 311.0 });
        assert_eq!(c.draft().filters, StructuredFilters::with_price_range(2.0, 311.0));
    }

    #[test]
    fn empty_catalog_uses_configured_fallback() {
        let config = SearchConfig {
            fallback_bounds: PriceBounds { min: 1.0, max: 50.0 },
            ..SearchConfig::default()
        };
        let mut c = SearchCoordinator::new(Arc::new(SharedSearchState::new()), &config);
        c.set_catalog(&CatalogSnapshot::default());
        c.open();
        assert_eq!(c.draft().filters, StructuredFilters::with_price_range(1.0, 50.0));
    }
}
