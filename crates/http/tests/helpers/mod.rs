//! Test harness for HTTP API integration tests.
//!
//! Builds an `AppContext` from fixture files and calls the handler functions
//! directly (no listener, no HTTP client).

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Json, State};
use marketscope_core::catalog::load_catalog;
use marketscope_core::labels::TranslationTable;
use marketscope_core::types::SearchConfig;
use marketscope_http::api::*;
use marketscope_http::AppContext;

pub fn fixture(name: &str) -> PathBuf {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    assert!(path.exists(), "Fixture '{name}' not found at {}", path.display());
    path
}

pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Context with the fixture catalog loaded and translations applied.
    pub fn with_catalog() -> Self {
        let translator = TranslationTable::load(&fixture("translations.json"))
            .expect("Failed to load translations fixture");
        let ctx = AppContext::new(&SearchConfig::default(), Arc::new(translator));
        let catalog = load_catalog(&fixture("catalog.json")).expect("Failed to load catalog fixture");
        ctx.coordinator().set_catalog(&catalog);
        TestHarness { ctx }
    }

    pub fn state(&self) -> State<AppContext> {
        State(self.ctx.clone())
    }

    pub async fn open(&self) -> PanelResponse {
        api_panel_open(self.state()).await.0
    }

    /// Send a draft command given as JSON. Returns the HTTP status on rejection.
    pub async fn draft(&self, command: serde_json::Value) -> Result<PanelResponse, u16> {
        let command = serde_json::from_value(command).expect("Invalid draft command JSON");
        api_draft(self.state(), Json(command)).await.map(|r| r.0).map_err(|(status, _)| status.as_u16())
    }

    pub async fn commit(&self) -> Result<CommitResponse, u16> {
        api_commit(self.state()).await.map(|r| r.0).map_err(|(status, _)| status.as_u16())
    }

    /// Let the query debounce settle.
    pub async fn settle(&self) {
        let delay = self.ctx.coordinator().debounce_delay();
        tokio::time::sleep(delay + std::time::Duration::from_millis(50)).await;
    }
}
