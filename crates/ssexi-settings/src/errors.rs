//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Why settings could not be loaded.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// Settings file.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The settings file is not JSON.
    #[error("{} is not valid JSON: {source}", .path.display())]
    Syntax {
        /// Settings file.
        path: PathBuf,
        /// Decoder failure.
        source: serde_json::Error,
    },

    /// Merged values do not fit the settings types.
    #[error("settings do not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),

    /// A field holds a value the runtime cannot work with.
    #[error("{field} {reason}")]
    Invalid {
        /// Dotted camelCase path of the field, as written in the file.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn read_error_names_the_file() {
        let err = SettingsError::Read {
            path: PathBuf::from("/etc/ssexi/settings.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "cannot read /etc/ssexi/settings.json: denied");
        assert!(err.source().is_some());
    }

    #[test]
    fn syntax_error_names_the_file() {
        let source = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err = SettingsError::Syntax { path: PathBuf::from("s.json"), source };
        assert!(err.to_string().starts_with("s.json is not valid JSON: "));
    }

    #[test]
    fn shape_error_from_conversion() {
        let json_err = serde_json::from_str::<u64>("\"x\"").unwrap_err();
        let err: SettingsError = json_err.into();
        assert!(matches!(err, SettingsError::Shape(_)));
    }

    #[test]
    fn invalid_display_leads_with_field() {
        let err = SettingsError::invalid("runtime.attributePrefix", "must not be empty");
        assert_eq!(err.to_string(), "runtime.attributePrefix must not be empty");
    }
}
