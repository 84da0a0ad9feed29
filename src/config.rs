//! Editor configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use tracing::warn;

use crate::consts::{
    DEFAULT_CROP_PAN_SENSITIVITY, DEFAULT_FLIP_DURATION_MS, DEFAULT_ITEM_SIZE, DEFAULT_UNDO_LIMIT, MIN_SIZE,
};

/// Tuning knobs for the editing engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// How long a page turn is held before the spread index changes.
    pub flip_duration: Duration,
    /// Multiplier applied to pointer deltas while panning a crop.
    pub crop_pan_sensitivity: f64,
    /// Maximum number of undo snapshots retained.
    pub undo_limit: usize,
    /// Width/height used for dropped items without an explicit size.
    pub default_item_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            flip_duration: Duration::from_millis(DEFAULT_FLIP_DURATION_MS),
            crop_pan_sensitivity: DEFAULT_CROP_PAN_SENSITIVITY,
            undo_limit: DEFAULT_UNDO_LIMIT,
            default_item_size: DEFAULT_ITEM_SIZE,
        }
    }
}

impl EditorConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// - `SCRAPBOOK_FLIP_MS`: page-turn duration in milliseconds (default 600)
    /// - `SCRAPBOOK_CROP_PAN_SENSITIVITY`: crop pan multiplier (default 1.0)
    /// - `SCRAPBOOK_UNDO_LIMIT`: undo snapshots kept (default 50)
    /// - `SCRAPBOOK_DEFAULT_ITEM_SIZE`: dropped item size (default 200, never below `MIN_SIZE`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key))
    }

    fn from_lookup<F, E>(lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, E>,
    {
        let flip_ms = parse_or(&lookup, "SCRAPBOOK_FLIP_MS", DEFAULT_FLIP_DURATION_MS);
        let sensitivity = parse_or(&lookup, "SCRAPBOOK_CROP_PAN_SENSITIVITY", DEFAULT_CROP_PAN_SENSITIVITY);
        let undo_limit = parse_or(&lookup, "SCRAPBOOK_UNDO_LIMIT", DEFAULT_UNDO_LIMIT);
        let item_size = parse_or(&lookup, "SCRAPBOOK_DEFAULT_ITEM_SIZE", DEFAULT_ITEM_SIZE);

        Self {
            flip_duration: Duration::from_millis(flip_ms),
            crop_pan_sensitivity: if sensitivity.is_finite() { sensitivity } else { DEFAULT_CROP_PAN_SENSITIVITY },
            undo_limit,
            default_item_size: if item_size.is_finite() { item_size.max(MIN_SIZE) } else { DEFAULT_ITEM_SIZE },
        }
    }
}

/// Parse an environment variable, returning `default` when unset or invalid.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    parse_or(&|k: &str| std::env::var(k), key, default)
}

fn parse_or<F, E, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Result<String, E>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid config value; using default");
            default
        }),
        Err(_) => default,
    }
}
