//! Draft filter state: the uncommitted query, scope, and filters edited while
//! the search overlay is open. Edits never touch the committed search state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::PriceBounds;
use crate::types::{CertStatus, ProductCategory, ReseedPolicy, SearchScope, StructuredFilters};

/// A single control interaction against the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum DraftCommand {
    SetQuery(String),
    SetScope(SearchScope),
    SetCategory(ProductCategory),
    SetCertStatus(CertStatus),
    SetPriceRange { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftState {
    /// Raw query text, before debouncing.
    pub query: String,
    /// Explicit scope selection.
    pub scope: SearchScope,
    pub filters: StructuredFilters,
    /// Bounds the price range was last seeded from.
    #[serde(skip)]
    seeded_from: Option<PriceBounds>,
    /// The user moved the price slider since the last seed.
    price_customized: bool,
}

impl DraftState {
    /// Fresh draft with the price range seeded from `bounds`.
    pub fn seeded(bounds: PriceBounds) -> Self {
        Self {
            query: String::new(),
            scope: SearchScope::All,
            filters: StructuredFilters::with_price_range(bounds.min, bounds.max),
            seeded_from: Some(bounds),
            price_customized: false,
        }
    }

    pub fn price_customized(&self) -> bool {
        self.price_customized
    }

    pub fn apply(&mut self, command: DraftCommand, bounds: PriceBounds) {
        match command {
            DraftCommand::SetQuery(query) => self.query = query,
            // Filters chosen under another scope are kept; consumers ignore them.
            DraftCommand::SetScope(scope) => self.scope = scope,
            DraftCommand::SetCategory(category) => self.filters.category = Some(category),
            DraftCommand::SetCertStatus(status) => self.filters.cert_status = Some(status),
            DraftCommand::SetPriceRange { min, max } => {
                let (min, max) = bounds.clamp(min, max);
                self.filters.min_price = Some(min);
                self.filters.max_price = Some(max);
                self.price_customized = true;
            }
        }
    }

    /// React to a bounds value. Returns true if the price range was re-seeded.
    ///
    /// Identical bounds are a no-op under every policy, so recomputing bounds for
    /// an unchanged catalog never reverts a user's range. When the bounds really
    /// change, [`ReseedPolicy::Always`] overwrites the range and
    /// [`ReseedPolicy::Preserve`] keeps a customized range, clamped into the new
    /// bounds.
    pub fn seed_bounds(&mut self, bounds: PriceBounds, policy: ReseedPolicy) -> bool {
        if self.seeded_from == Some(bounds) {
            return false;
        }
        self.seeded_from = Some(bounds);

        if self.price_customized && policy == ReseedPolicy::Preserve {
            let (min, max) = bounds.clamp(
                self.filters.min_price.unwrap_or(bounds.min),
                self.filters.max_price.unwrap_or(bounds.max),
            );
            self.filters.min_price = Some(min);
            self.filters.max_price = Some(max);
            debug!(min, max, "Kept customized price range across bounds change");
            return false;
        }

        self.filters.min_price = Some(bounds.min);
        self.filters.max_price = Some(bounds.max);
        self.price_customized = false;
        debug!(min = bounds.min, max = bounds.max, "Seeded draft price range");
        true
    }

    /// Empty query, scope `All`, and filters reduced to the seeded price range.
    pub fn reset(&mut self, bounds: PriceBounds) {
        *self = Self::seeded(bounds);
    }
}
