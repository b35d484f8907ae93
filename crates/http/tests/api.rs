//! Integration tests for the search overlay API.
//!
//! Each test builds an `AppContext` from the fixture catalog, then drives the
//! handlers the way the browser overlay would.

mod helpers;

use axum::extract::Json;
use helpers::TestHarness;
use marketscope_core::catalog::{CatalogSnapshot, PriceBounds};
use marketscope_core::coordinator::PanelState;
use marketscope_core::types::{EffectiveScope, ProductCategory, SearchScope};
use marketscope_http::api::*;
use serde_json::json;

// ---------------------------------------------------------------------------
// Bounds + catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bounds_from_fixture_catalog() {
    let h = TestHarness::with_catalog();
    let bounds = api_bounds(h.state()).await.0;
    // Unpriced and non-numeric entries are skipped
    assert_eq!(bounds, PriceBounds { min: 5.0, max: 250.0 });
}

#[tokio::test]
async fn test_replacing_catalog_recomputes_bounds() {
    let h = TestHarness::with_catalog();
    let bounds = api_catalog(h.state(), Json(CatalogSnapshot::default())).await.0;
    assert_eq!(bounds, PriceBounds { min: 0.0, max: 100.0 });
}

#[tokio::test]
async fn test_health_reports_panel_and_searches() {
    let h = TestHarness::with_catalog();
    let health = api_health(h.state()).await.0;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["panel"], "closed");
    assert_eq!(health["searches"], 0);
}

// ---------------------------------------------------------------------------
// Panel lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_open_seeds_draft_and_labels_view() {
    let h = TestHarness::with_catalog();
    let panel = h.open().await;
    assert_eq!(panel.panel, PanelState::Open);
    assert_eq!(panel.draft.filters.min_price, Some(5.0));
    assert_eq!(panel.draft.filters.max_price, Some(250.0));
    assert_eq!(panel.view.search_label, "Search");
    assert_eq!(panel.view.scopes[0].label, "Everything");
    // Untranslated keys fall back to the key itself
    let category = panel.view.category.expect("category visible for scope all");
    assert_eq!(category.options[1].label, "marketplace.categories.food");
}

#[tokio::test]
async fn test_draft_rejected_while_closed() {
    let h = TestHarness::with_catalog();
    let status = h.draft(json!({ "type": "setScope", "value": "products" })).await.unwrap_err();
    assert_eq!(status, 409);
    assert_eq!(h.commit().await.unwrap_err(), 409);
}

#[tokio::test]
async fn test_cancel_discards_draft() {
    let h = TestHarness::with_catalog();
    h.open().await;
    h.draft(json!({ "type": "setCategory", "value": "fashion" })).await.unwrap();
    let panel = api_panel_cancel(h.state()).await.0;
    assert_eq!(panel.panel, PanelState::Closed);

    let reopened = h.open().await;
    assert_eq!(reopened.draft.filters.category, None);
    assert!(api_search(h.state()).await.0.request.is_none());
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_commit_end_to_end() {
    let h = TestHarness::with_catalog();
    h.open().await;
    h.draft(json!({ "type": "setQuery", "value": "halal cert" })).await.unwrap();
    h.settle().await;

    let panel = api_panel(h.state()).await.0;
    assert_eq!(panel.debounced_query, "halal cert");

    let committed = h.commit().await.unwrap();
    assert_eq!(committed.effective_scope, EffectiveScope::Certificates);
    assert_eq!(committed.request.query, "halal cert");
    assert_eq!(committed.request.scope, SearchScope::All);
    assert_eq!(committed.request.filters.min_price, Some(5.0));
    assert_eq!(committed.request.filters.max_price, Some(250.0));

    let state = api_search(h.state()).await.0;
    assert_eq!(state.generation, 1);
    assert_eq!(state.last_route, Some(EffectiveScope::Certificates));
    assert_eq!(api_panel(h.state()).await.0.panel, PanelState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_commit_with_explicit_products_scope() {
    let h = TestHarness::with_catalog();
    h.open().await;
    h.draft(json!({ "type": "setQuery", "value": "certified dates" })).await.unwrap();
    h.draft(json!({ "type": "setScope", "value": "products" })).await.unwrap();
    h.draft(json!({ "type": "setCategory", "value": "food" })).await.unwrap();
    h.draft(json!({ "type": "setPriceRange", "value": { "min": 10, "max": 400 } })).await.unwrap();
    h.settle().await;

    let committed = h.commit().await.unwrap();
    assert_eq!(committed.effective_scope, EffectiveScope::Products);
    assert_eq!(committed.request.scope, SearchScope::Products);
    assert_eq!(committed.request.filters.category, Some(ProductCategory::Food));
    assert_eq!(committed.request.filters.max_price, Some(250.0));
}

#[tokio::test(start_paused = true)]
async fn test_clear_does_not_touch_committed_search() {
    let h = TestHarness::with_catalog();
    h.open().await;
    h.draft(json!({ "type": "setQuery", "value": "abaya" })).await.unwrap();
    h.settle().await;
    h.commit().await.unwrap();

    h.open().await;
    h.draft(json!({ "type": "setScope", "value": "certificates" })).await.unwrap();
    h.draft(json!({ "type": "setCertStatus", "value": "expired" })).await.unwrap();
    let cleared = api_clear(h.state()).await.0;
    assert_eq!(cleared.draft.scope, SearchScope::All);
    assert_eq!(cleared.draft.filters.cert_status, None);
    assert_eq!(cleared.draft.filters.min_price, Some(5.0));

    let state = api_search(h.state()).await.0;
    assert_eq!(state.request.unwrap().query, "abaya");
    assert_eq!(state.generation, 1);
}
