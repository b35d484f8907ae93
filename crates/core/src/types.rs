//! Core types shared across MarketScope: search scopes, structured filters,
//! the committed search request, and wire-format parsing for the enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Failure to parse one of the closed enumerations from its wire spelling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown search scope '{0}' (expected all, products, certificates)")]
    Scope(String),

    #[error("unknown product category '{0}' (expected all, food, cosmetics, fashion, pharmaceuticals)")]
    Category(String),

    #[error("unknown certification status '{0}' (expected all, certified, expired, notCertified)")]
    CertStatus(String),
}

// ---------------------------------------------------------------------------
// Scopes
// ---------------------------------------------------------------------------

/// The kind of entity being searched, as selected in the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    All,
    Products,
    Certificates,
}

impl SearchScope {
    pub const ALL: [SearchScope; 3] =
        [SearchScope::All, SearchScope::Products, SearchScope::Certificates];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchScope::All => "all",
            SearchScope::Products => "products",
            SearchScope::Certificates => "certificates",
        }
    }

    /// Category and price range apply to this scope.
    pub fn shows_product_filters(self) -> bool {
        matches!(self, SearchScope::All | SearchScope::Products)
    }

    /// Certification status applies to this scope.
    pub fn shows_certificate_filters(self) -> bool {
        matches!(self, SearchScope::All | SearchScope::Certificates)
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SearchScope::All),
            "products" => Ok(SearchScope::Products),
            "certificates" => Ok(SearchScope::Certificates),
            _ => Err(ParseError::Scope(s.to_string())),
        }
    }
}

/// A concrete, renderable scope. `All` has no result view of its own, so every
/// commit routes to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveScope {
    Products,
    Certificates,
}

impl EffectiveScope {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectiveScope::Products => "products",
            EffectiveScope::Certificates => "certificates",
        }
    }
}

impl fmt::Display for EffectiveScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Filter enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    #[default]
    All,
    Food,
    Cosmetics,
    Fashion,
    Pharmaceuticals,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 5] = [
        ProductCategory::All,
        ProductCategory::Food,
        ProductCategory::Cosmetics,
        ProductCategory::Fashion,
        ProductCategory::Pharmaceuticals,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductCategory::All => "all",
            ProductCategory::Food => "food",
            ProductCategory::Cosmetics => "cosmetics",
            ProductCategory::Fashion => "fashion",
            ProductCategory::Pharmaceuticals => "pharmaceuticals",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ProductCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| ParseError::Category(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CertStatus {
    #[default]
    All,
    Certified,
    Expired,
    NotCertified,
}

impl CertStatus {
    pub const ALL: [CertStatus; 4] =
        [CertStatus::All, CertStatus::Certified, CertStatus::Expired, CertStatus::NotCertified];

    pub fn as_str(self) -> &'static str {
        match self {
            CertStatus::All => "all",
            CertStatus::Certified => "certified",
            CertStatus::Expired => "expired",
            CertStatus::NotCertified => "notCertified",
        }
    }
}

impl fmt::Display for CertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept "not-certified" / "not_certified" as CLI spellings of notCertified
        let normalized: String = s.trim().chars().filter(|c| *c != '-' && *c != '_').collect();
        CertStatus::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseError::CertStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Structured filters
// ---------------------------------------------------------------------------

/// Scope-dependent filters. Every field is optional; fields that do not apply
/// to a scope may still be present and must be ignored by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_status: Option<CertStatus>,
}

impl StructuredFilters {
    /// Filters holding only a price range.
    pub fn with_price_range(min: f64, max: f64) -> Self {
        Self { min_price: Some(min), max_price: Some(max), ..Self::default() }
    }

    pub fn effective_category(&self) -> ProductCategory {
        self.category.unwrap_or_default()
    }

    pub fn effective_cert_status(&self) -> CertStatus {
        self.cert_status.unwrap_or_default()
    }

    /// Copy with the fields that do not apply to `scope` removed.
    pub fn relevant_to(&self, scope: SearchScope) -> Self {
        let mut out = *self;
        if !scope.shows_product_filters() {
            out.category = None;
            out.min_price = None;
            out.max_price = None;
        }
        if !scope.shows_certificate_filters() {
            out.cert_status = None;
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Search configuration, loaded from .marketscope.toml or defaults
// ---------------------------------------------------------------------------

/// What happens to the draft price range when the catalog bounds change while
/// the user has already moved the slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReseedPolicy {
    /// Re-seed unconditionally from the new bounds.
    Always,
    /// Keep a user-adjusted range, clamped into the new bounds.
    #[default]
    Preserve,
}

impl FromStr for ReseedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(ReseedPolicy::Always),
            "preserve" => Ok(ReseedPolicy::Preserve),
            other => Err(format!("unknown reseed policy '{other}' (expected preserve, always)")),
        }
    }
}

/// Runtime configuration for the search overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Quiet period before a typed query counts as stable.
    pub debounce: std::time::Duration,
    pub reseed_policy: ReseedPolicy,
    /// Bounds used when the catalog has no priced items.
    pub fallback_bounds: crate::catalog::PriceBounds,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: std::time::Duration::from_millis(crate::debounce::DEFAULT_DEBOUNCE_MS),
            reseed_policy: ReseedPolicy::default(),
            fallback_bounds: crate::catalog::FALLBACK_BOUNDS,
        }
    }
}

// ---------------------------------------------------------------------------
// Committed request
// ---------------------------------------------------------------------------

/// The published result of a commit. Replaced wholesale by the next commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedSearchRequest {
    pub query: String,
    pub filters: StructuredFilters,
    pub scope: SearchScope,
}

impl CommittedSearchRequest {
    /// Filters as downstream result views should interpret them.
    pub fn relevant_filters(&self) -> StructuredFilters {
        self.filters.relevant_to(self.scope)
    }
}
