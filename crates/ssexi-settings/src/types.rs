//! Settings type definitions.
//!
//! All types use camelCase JSON names and `#[serde(default)]`, so a partial
//! settings file only needs the keys it overrides.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "runtime": { "reconnectDelayMs": 2000 },
///   "scripts": { "allowExec": true }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SsexiSettings {
    /// Settings schema version.
    pub version: String,
    /// Binding and reconnect behavior.
    pub runtime: RuntimeSettings,
    /// Script capability gate.
    pub scripts: ScriptSettings,
    /// HTTP transport settings.
    pub transport: TransportSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for SsexiSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            runtime: RuntimeSettings::default(),
            scripts: ScriptSettings::default(),
            transport: TransportSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl SsexiSettings {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.runtime.attribute_prefix.is_empty() {
            return Err(SettingsError::invalid(
                "runtime.attributePrefix",
                "must not be empty",
            ));
        }
        if let Some(base) = &self.transport.base_url {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(SettingsError::invalid(
                    "transport.baseUrl",
                    format!("must be an http(s) URL, got {base}"),
                ));
            }
        }
        Ok(())
    }
}

/// Binding and reconnect behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSettings {
    /// Delay before a failed push connection is re-established.
    pub reconnect_delay_ms: u64,
    /// Prefix of the binding attributes (`sx-connect`, `sx-post`, ...).
    pub attribute_prefix: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 5_000,
            attribute_prefix: "sx-".to_string(),
        }
    }
}

/// Which script instructions the runtime forwards to the host.
///
/// Execution of server-supplied code is off unless explicitly enabled.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptSettings {
    /// Forward `exec` instructions to the script host.
    pub allow_exec: bool,
    /// Forward global assignments to the script host.
    pub allow_assign: bool,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            allow_exec: false,
            allow_assign: true,
        }
    }
}

/// HTTP transport settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportSettings {
    /// Base URL that relative endpoints are resolved against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// TCP connect timeout for push streams and form posts.
    pub connect_timeout_ms: u64,
    /// Total timeout of a form post.
    pub submit_timeout_ms: u64,
    /// `User-Agent` header.
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout_ms: 10_000,
            submit_timeout_ms: 30_000,
            user_agent: concat!("ssexi/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(SsexiSettings::default()).unwrap();
        assert_eq!(json["runtime"]["reconnectDelayMs"], 5_000);
        assert_eq!(json["scripts"]["allowExec"], false);
        assert!(json["transport"].get("baseUrl").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: SsexiSettings =
            serde_json::from_str(r#"{"runtime": {"reconnectDelayMs": 250}}"#).unwrap();
        assert_eq!(settings.runtime.reconnect_delay_ms, 250);
        assert_eq!(settings.runtime.attribute_prefix, "sx-");
        assert!(settings.scripts.allow_assign);
    }

    #[test]
    fn empty_prefix_is_invalid() {
        let mut settings = SsexiSettings::default();
        settings.runtime.attribute_prefix.clear();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { field: "runtime.attributePrefix", .. })
        ));
    }

    #[test]
    fn non_http_base_url_is_invalid() {
        let mut settings = SsexiSettings::default();
        settings.transport.base_url = Some("ftp://example.com".into());
        assert!(settings.validate().is_err());
        settings.transport.base_url = Some("http://localhost:8001".into());
        assert!(settings.validate().is_ok());
    }
}
