//! Catalog snapshots and the price bounds derived from them.
//!
//! Only `price` is read from catalog items. A missing, `null`, non-numeric, or
//! non-finite price is treated as absent and excluded from the bounds.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::LoadError;

/// Bounds used when no item in the snapshot carries a usable price.
pub const FALLBACK_BOUNDS: PriceBounds = PriceBounds { min: 0.0, max: 100.0 };

// ---------------------------------------------------------------------------
// Catalog items
// ---------------------------------------------------------------------------

/// A priced catalog entry. Any other fields in the source JSON are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
}

impl CatalogItem {
    pub fn priced(price: f64) -> Self {
        Self { price: Some(price) }
    }

    /// The price if it is usable for bounds computation.
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite())
    }
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|p| p.is_finite()))
}

/// An ordered, immutable view of the catalog at one point in time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    pub items: Vec<CatalogItem>,
}

impl CatalogSnapshot {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    pub fn from_prices(prices: &[f64]) -> Self {
        Self::new(prices.iter().copied().map(CatalogItem::priced).collect())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn bounds(&self) -> PriceBounds {
        PriceBounds::from_snapshot(self)
    }
}

/// Source of the current catalog snapshot.
pub trait CatalogProvider {
    fn catalog_snapshot(&self) -> CatalogSnapshot;
}

impl CatalogProvider for CatalogSnapshot {
    fn catalog_snapshot(&self) -> CatalogSnapshot {
        self.clone()
    }
}

/// Load a catalog from a JSON array of items.
pub fn load_catalog(path: &Path) -> Result<CatalogSnapshot, LoadError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LoadError::Read { path: path.display().to_string(), source })?;
    let snapshot: CatalogSnapshot = serde_json::from_str(&content)
        .map_err(|source| LoadError::Parse { path: path.display().to_string(), source })?;

    let priced = snapshot.items.iter().filter(|i| i.usable_price().is_some()).count();
    info!(path = %path.display(), items = snapshot.len(), priced, "Loaded catalog");
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Price bounds
// ---------------------------------------------------------------------------

/// Whole-number price range spanning the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceBounds {
    fn default() -> Self {
        FALLBACK_BOUNDS
    }
}

impl PriceBounds {
    /// `floor` of the lowest and `ceil` of the highest usable price, or the
    /// fallback bounds when nothing is priced.
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        Self::from_snapshot_or(snapshot, FALLBACK_BOUNDS)
    }

    pub fn from_snapshot_or(snapshot: &CatalogSnapshot, fallback: PriceBounds) -> Self {
        let mut prices = snapshot.items.iter().filter_map(CatalogItem::usable_price);
        let Some(first) = prices.next() else {
            debug!(min = fallback.min, max = fallback.max, "No priced items, using fallback bounds");
            return fallback;
        };
        let (lo, hi) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        PriceBounds { min: lo.floor(), max: hi.ceil() }
    }

    /// Clamp a requested range into these bounds, ordered so `min <= max`.
    pub fn clamp(&self, min: f64, max: f64) -> (f64, f64) {
        let lo = if min.is_finite() { min.clamp(self.min, self.max) } else { self.min };
        let hi = if max.is_finite() { max.clamp(self.min, self.max) } else { self.max };
        if lo <= hi {
            (lo, hi)
        } else {
            (hi, lo)
        }
    }
}
