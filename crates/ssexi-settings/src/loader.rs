//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`SsexiSettings::default()`]
//! 2. If `~/.ssexi/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::SsexiSettings;

/// Resolve the path to the settings file (`~/.ssexi/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".ssexi").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<SsexiSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<SsexiSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<SsexiSettings> {
    let defaults = serde_json::to_value(SsexiSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Syntax {
            path: path.to_path_buf(),
            source,
        })?;
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

/// Apply `SSEXI_*` environment variable overrides.
///
/// Invalid values are ignored with a warning (file/default value stays).
pub fn apply_env_overrides(settings: &mut SsexiSettings) {
    if let Some(v) = read_env_u64("SSEXI_RECONNECT_DELAY_MS", 0, 3_600_000) {
        settings.runtime.reconnect_delay_ms = v;
    }
    if let Some(v) = read_env_string("SSEXI_ATTRIBUTE_PREFIX") {
        settings.runtime.attribute_prefix = v;
    }
    if let Some(v) = read_env_bool("SSEXI_ALLOW_EXEC") {
        settings.scripts.allow_exec = v;
    }
    if let Some(v) = read_env_bool("SSEXI_ALLOW_ASSIGN") {
        settings.scripts.allow_assign = v;
    }
    if let Some(v) = read_env_string("SSEXI_BASE_URL") {
        settings.transport.base_url = Some(v);
    }
    if let Some(v) = read_env_u64("SSEXI_CONNECT_TIMEOUT_MS", 100, 600_000) {
        settings.transport.connect_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("SSEXI_SUBMIT_TIMEOUT_MS", 100, 3_600_000) {
        settings.transport.submit_timeout_ms = v;
    }
    if let Some(v) = read_env_string("SSEXI_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_bool("SSEXI_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}
