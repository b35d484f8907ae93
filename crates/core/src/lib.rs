//! MarketScope core: the search overlay of the marketplace front-end.
//!
//! Reconciles a free-text query, an explicit search scope, and scope-dependent
//! filters into one committed search request, while keeping an uncommitted
//! draft responsive to rapid typing.
//!
//! # Modules
//!
//! - [`types`]: Scopes, filter enumerations, committed request, configuration
//! - [`catalog`]: Catalog snapshots and derived price bounds
//! - [`debounce`]: Cancellable single-shot debounce over tokio timers
//! - [`draft`]: Draft filter state and control commands
//! - [`error`]: Errors for loading JSON inputs
//! - [`state`]: Shared search state (single writer, many readers)
//! - [`coordinator`]: Panel lifecycle, scope inference, and commit
//! - [`labels`]: Translation keys and the labelled panel view

pub mod catalog;
pub mod coordinator;
pub mod debounce;
pub mod draft;
pub mod error;
pub mod labels;
pub mod state;
pub mod types;

use std::time::Duration;

use tracing::{debug, warn};

use catalog::PriceBounds;
use types::{ReseedPolicy, SearchConfig};

// ---------------------------------------------------------------------------
// .marketscope.toml config loading
// ---------------------------------------------------------------------------

/// Known keys in `.marketscope.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] = &["debounce_ms", "reseed_policy", "fallback_min", "fallback_max"];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn as_number(value: &toml::Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|i| i as f64)).filter(|f| f.is_finite())
}

/// Numeric config value under `key`; a present but non-numeric value is
/// warned about and treated as absent.
fn config_number(table: &toml::Table, key: &str) -> Option<f64> {
    let value = table.get(key)?;
    let number = as_number(value);
    if number.is_none() {
        warn!(key, value = %value, "{key} must be a finite number");
    }
    number
}

/// Load search configuration from `.marketscope.toml` in the given directory.
///
/// Returns a [`SearchConfig`] with defaults merged with any overrides from the
/// config file. A missing or unparsable file yields defaults (the latter with a
/// warning). Unknown keys and invalid values are warned about and skipped.
pub fn load_marketscope_config(dir: &std::path::Path) -> SearchConfig {
    let mut config = SearchConfig::default();
    let config_path = dir.join(".marketscope.toml");

    if !config_path.exists() {
        return config;
    }
    debug!(path = %config_path.display(), "Loading .marketscope.toml");

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Could not read .marketscope.toml");
            return config;
        }
    };
    let table = match content.parse::<toml::Table>() {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "Failed to parse .marketscope.toml");
            return config;
        }
    };

    // Validate keys, warn on unknown
    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS
            .iter()
            .min_by_key(|k| edit_distance(key, k))
            .copied()
            .unwrap_or_default();
        if edit_distance(key, suggestion) <= 3 {
            warn!(
                key = key.as_str(),
                suggestion,
                "Unknown key in .marketscope.toml; did you mean '{suggestion}'?"
            );
        } else {
            warn!(
                key = key.as_str(),
                "Unknown key in .marketscope.toml (known keys: {})",
                KNOWN_CONFIG_KEYS.join(", ")
            );
        }
    }

    // debounce_ms
    if let Some(v) = table.get("debounce_ms") {
        match v.as_integer().and_then(|ms| u64::try_from(ms).ok()) {
            Some(ms) => config.debounce = Duration::from_millis(ms),
            None => warn!(value = %v, "debounce_ms must be a non-negative integer"),
        }
    }

    // reseed_policy
    if let Some(v) = table.get("reseed_policy") {
        match v.as_str().map(str::parse::<ReseedPolicy>) {
            Some(Ok(policy)) => config.reseed_policy = policy,
            Some(Err(e)) => warn!("{e}"),
            None => warn!(value = %v, "reseed_policy must be a string"),
        }
    }

    // fallback_min / fallback_max are applied together so min <= max holds
    let min = config_number(&table, "fallback_min").unwrap_or(config.fallback_bounds.min);
    let max = config_number(&table, "fallback_max").unwrap_or(config.fallback_bounds.max);
    if min <= max {
        config.fallback_bounds = PriceBounds { min, max };
    } else {
        warn!(min, max, "fallback_min is greater than fallback_max, keeping defaults");
    }

    config
}
