//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`MmspSettings::default()`]
//! 2. If `~/.mmsp/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `MMSP_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use mmsp_core::logging::LogFormat;
use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::MmspSettings;

/// Directory holding all client state (`~/.mmsp`).
pub fn config_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".mmsp")
}

/// Resolve the path to the settings file (`~/.mmsp/settings.json`).
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<MmspSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<MmspSettings> {
    let mut settings = load_file_layer(path)?;
    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<MmspSettings> {
    let defaults = serde_json::to_value(MmspSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `MMSP_*` overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (falling back to file/default).
pub fn apply_overrides(settings: &mut MmspSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(val) = read("MMSP_CALL_TIMEOUT_MS") {
        match parse_u64_range(&val, 100, 3_600_000) {
            Some(v) => settings.client.call_timeout_ms = v,
            None => tracing::warn!(key = "MMSP_CALL_TIMEOUT_MS", value = %val, "invalid env var, ignoring"),
        }
    }
    if let Some(val) = read("MMSP_RECONNECT_DELAY_MS") {
        match parse_u64_range(&val, 100, 3_600_000) {
            Some(v) => settings.client.reconnect_delay_ms = v,
            None => tracing::warn!(key = "MMSP_RECONNECT_DELAY_MS", value = %val, "invalid env var, ignoring"),
        }
    }
    if let Some(val) = read("MMSP_LOG_LEVEL") {
        settings.logging.level = val;
    }
    if let Some(val) = read("MMSP_LOG_FORMAT") {
        match parse_log_format(&val) {
            Some(format) => settings.logging.format = format,
            None => tracing::warn!(key = "MMSP_LOG_FORMAT", value = %val, "invalid env var, ignoring"),
        }
    }
    if let Some(val) = read("MMSP_PROFILE") {
        settings.active_profile = Some(val);
    }
}

fn validate(settings: &MmspSettings) -> Result<()> {
    if settings.client.call_timeout_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "client.callTimeoutMs must be greater than 0".into(),
        ));
    }
    if settings.client.reconnect_delay_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "client.reconnectDelayMs must be greater than 0".into(),
        ));
    }
    Ok(())
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a log format name (case-insensitive).
pub fn parse_log_format(val: &str) -> Option<LogFormat> {
    match val.to_lowercase().as_str() {
        "compact" | "text" => Some(LogFormat::Compact),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
