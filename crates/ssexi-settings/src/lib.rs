//! # ssexi-settings
//!
//! Configuration for the SSEXI runtime, loaded from three layers (in
//! priority order):
//! 1. **Compiled defaults**: [`SsexiSettings::default()`]
//! 2. **User file**: `~/.ssexi/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `SSEXI_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use ssexi_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("reconnect after {}ms", settings.runtime.reconnect_delay_ms);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<SsexiSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// Loaded on first access; falls back to compiled defaults when loading
/// fails.
pub fn get_settings() -> &'static SsexiSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: SsexiSettings) -> std::result::Result<(), SsexiSettings> {
    SETTINGS.set(settings)
}
