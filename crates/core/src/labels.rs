//! Presentation keys for the search overlay and the labelled panel view a
//! front-end renders. String lookup itself is delegated to a [`Translator`].

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::catalog::PriceBounds;
use crate::draft::DraftState;
use crate::error::LoadError;
use crate::types::{CertStatus, ProductCategory, SearchScope};

pub const KEY_PLACEHOLDER: &str = "header.searchPlaceholder";
pub const KEY_SEARCH_IN: &str = "search.searchIn";
pub const KEY_FILTERS: &str = "search.filters";
pub const KEY_CATEGORY: &str = "search.category";
pub const KEY_PRICE_RANGE: &str = "marketplace.priceRange";
pub const KEY_CERT_STATUS: &str = "search.certificationStatus";
pub const KEY_CLEAR_ALL: &str = "search.clearAll";
pub const KEY_SEARCH_BUTTON: &str = "search.searchButton";

/// Read-only string lookup keyed by id.
pub trait Translator {
    fn t(&self, key: &str) -> String;
}

/// Returns every key unchanged. Useful when no translation table is loaded.
pub struct KeyEcho;

impl Translator for KeyEcho {
    fn t(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Flat key -> text table. Missing keys fall back to the key itself.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: HashMap<String, String>,
}

impl TranslationTable {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Load a flat JSON object of key -> text.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| LoadError::Read { path: path.display().to_string(), source })?;
        let entries = serde_json::from_str(&content)
            .map_err(|source| LoadError::Parse { path: path.display().to_string(), source })?;
        Ok(Self { entries })
    }
}

impl Translator for TranslationTable {
    fn t(&self, key: &str) -> String {
        self.entries.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

// ---------------------------------------------------------------------------
// Enum -> key mapping
// ---------------------------------------------------------------------------

pub fn scope_key(scope: SearchScope) -> &'static str {
    match scope {
        SearchScope::All => "search.scopeAll",
        SearchScope::Products => "search.scopeProducts",
        SearchScope::Certificates => "search.scopeCertificates",
    }
}

pub fn category_key(category: ProductCategory) -> String {
    format!("marketplace.categories.{}", category.as_str())
}

pub fn cert_status_key(status: CertStatus) -> &'static str {
    match status {
        CertStatus::All => "home.news.categories.all",
        CertStatus::Certified => "certCheck.statusCertified",
        CertStatus::Expired => "certCheck.statusExpired",
        CertStatus::NotCertified => "certCheck.statusNotCertified",
    }
}

// ---------------------------------------------------------------------------
// Panel view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledOption {
    pub value: &'static str,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeView {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub value_min: f64,
    pub value_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectView {
    pub label: String,
    pub options: Vec<LabelledOption>,
}

/// Everything the overlay shows for the current draft. Sections that do not
/// apply to the selected scope are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub placeholder: String,
    pub query: String,
    pub scopes_label: String,
    pub scopes: Vec<LabelledOption>,
    pub filters_label: String,
    pub category: Option<SelectView>,
    pub price: Option<PriceRangeView>,
    pub cert_status: Option<SelectView>,
    pub clear_label: String,
    pub search_label: String,
}

impl PanelView {
    pub fn build(draft: &DraftState, bounds: PriceBounds, tr: &dyn Translator) -> Self {
        let scope = draft.scope;
        let filters = &draft.filters;

        let scopes = SearchScope::ALL
            .into_iter()
            .map(|s| LabelledOption { value: s.as_str(), label: tr.t(scope_key(s)), selected: s == scope })
            .collect();

        let category = scope.shows_product_filters().then(|| {
            let current = filters.effective_category();
            SelectView {
                label: tr.t(KEY_CATEGORY),
                options: ProductCategory::ALL
                    .into_iter()
                    .map(|c| LabelledOption {
                        value: c.as_str(),
                        label: tr.t(&category_key(c)),
                        selected: c == current,
                    })
                    .collect(),
            }
        });

        let price = scope.shows_product_filters().then(|| PriceRangeView {
            label: tr.t(KEY_PRICE_RANGE),
            min: bounds.min,
            max: bounds.max,
            value_min: filters.min_price.unwrap_or(bounds.min),
            value_max: filters.max_price.unwrap_or(bounds.max),
        });

        let cert_status = scope.shows_certificate_filters().then(|| {
            let current = filters.effective_cert_status();
            SelectView {
                label: tr.t(KEY_CERT_STATUS),
                options: CertStatus::ALL
                    .into_iter()
                    .map(|s| LabelledOption {
                        value: s.as_str(),
                        label: tr.t(cert_status_key(s)),
                        selected: s == current,
                    })
                    .collect(),
            }
        });

        PanelView {
            placeholder: tr.t(KEY_PLACEHOLDER),
            query: draft.query.clone(),
            scopes_label: tr.t(KEY_SEARCH_IN),
            scopes,
            filters_label: tr.t(KEY_FILTERS),
            category,
            price,
            cert_status,
            clear_label: tr.t(KEY_CLEAR_ALL),
            search_label: tr.t(KEY_SEARCH_BUTTON),
        }
    }
}
