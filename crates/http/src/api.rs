use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use serde::Serialize;

use marketscope_core::catalog::{CatalogSnapshot, PriceBounds};
use marketscope_core::coordinator::PanelState;
use marketscope_core::draft::{DraftCommand, DraftState};
use marketscope_core::labels::PanelView;
use marketscope_core::types::{CommittedSearchRequest, EffectiveScope};

use crate::AppContext;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn panel_closed() -> ApiError {
    (StatusCode::CONFLICT, Json(serde_json::json!({ "error": "Search panel is closed" })))
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelResponse {
    pub panel: PanelState,
    pub draft: DraftState,
    pub debounced_query: String,
    pub bounds: PriceBounds,
    pub view: PanelView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub effective_scope: EffectiveScope,
    pub request: CommittedSearchRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStateResponse {
    pub request: Option<CommittedSearchRequest>,
    pub generation: u64,
    pub last_route: Option<EffectiveScope>,
}

fn panel_response(ctx: &AppContext) -> PanelResponse {
    let coordinator = ctx.coordinator();
    PanelResponse {
        panel: coordinator.panel(),
        draft: coordinator.draft().clone(),
        debounced_query: coordinator.debounced_query(),
        bounds: coordinator.bounds(),
        view: PanelView::build(coordinator.draft(), coordinator.bounds(), ctx.translator.as_ref()),
    }
}

// ---------------------------------------------------------------------------
// Health + catalog
// ---------------------------------------------------------------------------

pub async fn api_health(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "uptime_secs": ctx.start_time.elapsed().as_secs(),
        "panel": ctx.coordinator().panel(),
        "searches": ctx.shared.generation(),
    }))
}

pub async fn api_bounds(State(ctx): State<AppContext>) -> Json<PriceBounds> {
    Json(ctx.coordinator().bounds())
}

/// Replace the catalog snapshot. Responds with the recomputed bounds.
pub async fn api_catalog(
    State(ctx): State<AppContext>,
    Json(snapshot): Json<CatalogSnapshot>,
) -> Json<PriceBounds> {
    let mut coordinator = ctx.coordinator();
    coordinator.set_catalog(&snapshot);
    Json(coordinator.bounds())
}

// ---------------------------------------------------------------------------
// Panel lifecycle + draft
// ---------------------------------------------------------------------------

pub async fn api_panel(State(ctx): State<AppContext>) -> Json<PanelResponse> {
    Json(panel_response(&ctx))
}

pub async fn api_panel_open(State(ctx): State<AppContext>) -> Json<PanelResponse> {
    ctx.coordinator().open();
    Json(panel_response(&ctx))
}

pub async fn api_panel_cancel(State(ctx): State<AppContext>) -> Json<PanelResponse> {
    ctx.coordinator().cancel();
    Json(panel_response(&ctx))
}

pub async fn api_draft(
    State(ctx): State<AppContext>,
    Json(command): Json<DraftCommand>,
) -> Result<Json<PanelResponse>, ApiError> {
    if !ctx.coordinator().input(command) {
        return Err(panel_closed());
    }
    Ok(Json(panel_response(&ctx)))
}

// ---------------------------------------------------------------------------
// Commit + clear + committed state
// ---------------------------------------------------------------------------

pub async fn api_commit(State(ctx): State<AppContext>) -> Result<Json<CommitResponse>, ApiError> {
    let effective_scope = ctx.coordinator().commit().ok_or_else(panel_closed)?;
    let request = ctx.shared.current().map(|r| (*r).clone()).ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Committed search missing after commit" })),
        )
    })?;
    Ok(Json(CommitResponse { effective_scope, request }))
}

pub async fn api_clear(State(ctx): State<AppContext>) -> Json<PanelResponse> {
    ctx.coordinator().clear();
    Json(panel_response(&ctx))
}

pub async fn api_search(State(ctx): State<AppContext>) -> Json<SearchStateResponse> {
    Json(SearchStateResponse {
        request: ctx.shared.current().map(|r| (*r).clone()),
        generation: ctx.shared.generation(),
        last_route: ctx.last_route(),
    })
}
