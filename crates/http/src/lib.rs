//! MarketScope HTTP API: JSON endpoints driving one search overlay session
//! from a browser front-end.
//!
//! Handlers live in [`api`]; [`router`] wires them up and [`serve`] runs the
//! server with graceful shutdown.

pub mod api;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use marketscope_core::coordinator::SearchCoordinator;
use marketscope_core::labels::Translator;
use marketscope_core::state::SharedSearchState;
use marketscope_core::types::{EffectiveScope, SearchConfig};

use api::*;

/// Axum application state: the coordinator behind a lock, the shared search
/// state it publishes to, and the translator used for panel labels.
#[derive(Clone)]
pub struct AppContext {
    coordinator: Arc<Mutex<SearchCoordinator>>,
    pub shared: Arc<SharedSearchState>,
    pub translator: Arc<dyn Translator + Send + Sync>,
    last_route: Arc<Mutex<Option<EffectiveScope>>>,
    /// Server start time for uptime reporting via `/health`.
    pub start_time: Instant,
}

impl AppContext {
    pub fn new(config: &SearchConfig, translator: Arc<dyn Translator + Send + Sync>) -> Self {
        let shared = Arc::new(SharedSearchState::new());
        let last_route = Arc::new(Mutex::new(None));
        let route_slot = Arc::clone(&last_route);
        let coordinator = SearchCoordinator::new(shared.clone(), config).with_router(move |scope| {
            info!(scope = %scope, "Routing to result view");
            *route_slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(scope);
        });

        Self {
            coordinator: Arc::new(Mutex::new(coordinator)),
            shared,
            translator,
            last_route,
            start_time: Instant::now(),
        }
    }

    pub fn coordinator(&self) -> MutexGuard<'_, SearchCoordinator> {
        self.coordinator.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Scope routed by the most recent commit.
    pub fn last_route(&self) -> Option<EffectiveScope> {
        *self.last_route.lock().unwrap_or_else(|p| p.into_inner())
    }
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(api_health))
        .route("/api/bounds", get(api_bounds))
        .route("/api/catalog", put(api_catalog))
        .route("/api/panel", get(api_panel))
        .route("/api/panel/open", post(api_panel_open))
        .route("/api/panel/cancel", post(api_panel_cancel))
        .route("/api/draft", post(api_draft))
        .route("/api/search", get(api_search))
        .route("/api/search/commit", post(api_commit))
        .route("/api/search/clear", post(api_clear))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

// ---------------------------------------------------------------------------
// Graceful shutdown signal
// ---------------------------------------------------------------------------

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(_) => {
                let _ = ctrl_c.await;
                info!("Received SIGINT, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("Received Ctrl+C, shutting down...");
    }
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn serve(ctx: AppContext, bind_addr: &str, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("{bind_addr}:{port}")).await?;
    let port = listener.local_addr()?.port();
    info!(port = port, "http://localhost:{port}");

    axum::serve(listener, router(ctx)).with_graceful_shutdown(shutdown_signal()).await
}
