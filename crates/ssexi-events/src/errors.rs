//! Observer error types.

use thiserror::Error;

/// Errors an observer may return. The bus logs them and continues.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// Observer failed while handling a notification.
    #[error("observer '{name}' failed: {message}")]
    Failed {
        /// Observer name.
        name: String,
        /// Failure description.
        message: String,
    },

    /// Observer received a detail payload it could not interpret.
    #[error("observer '{name}' rejected detail: {source}")]
    BadDetail {
        /// Observer name.
        name: String,
        /// Deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_display() {
        let err = ObserverError::Failed {
            name: "audit".into(),
            message: "disk full".into(),
        };
        assert_eq!(err.to_string(), "observer 'audit' failed: disk full");
    }
}
