//! Runtime error types.
//!
//! No runtime error is fatal. Each one is reported through a lifecycle
//! notification whose detail carries the [`ErrorKind`] and message.

use serde::Serialize;
use ssexi_core::{DomError, NodeId};
use ssexi_settings::SettingsError;
use thiserror::Error;

use crate::protocol::ParseError;
use crate::script::ScriptError;
use crate::transport::TransportError;

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Push connection failed; a reconnect follows.
    Connection,
    /// A frame or fragment could not be decoded.
    Parse,
    /// A fragment named a node that does not exist.
    TargetMissing,
    /// A form post failed.
    Submission,
    /// A script instruction was rejected or failed.
    Script,
    /// A document operation failed or the caller passed an unusable node.
    Document,
    /// Settings were rejected.
    Config,
}

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Push connection failure.
    #[error("connection to '{endpoint}' failed: {message}")]
    Connection {
        /// Endpoint.
        endpoint: String,
        /// Failure description.
        message: String,
    },

    /// Frame decoding failure.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Fragment markup without a root element.
    #[error("markup for '{0}' has no root element")]
    EmptyFragment(String),

    /// No node carries the targeted id.
    #[error("no element with id '{0}'")]
    TargetMissing(String),

    /// Form post failure.
    #[error("submission to '{endpoint}' failed: {message}")]
    Submission {
        /// Endpoint.
        endpoint: String,
        /// Failure description.
        message: String,
    },

    /// The node is not a bound form.
    #[error("node {0} is not a bound form")]
    NotBound(NodeId),

    /// The runtime was torn down and accepts no more work.
    #[error("runtime has been torn down")]
    TornDown,

    /// Script instruction failure.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Document operation failure.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// Transport construction failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid settings.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl RuntimeError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } | Self::Transport(_) => ErrorKind::Connection,
            Self::Parse(_) | Self::EmptyFragment(_) => ErrorKind::Parse,
            Self::TargetMissing(_) => ErrorKind::TargetMissing,
            Self::Submission { .. } => ErrorKind::Submission,
            Self::Script(_) => ErrorKind::Script,
            Self::NotBound(_) | Self::TornDown | Self::Dom(_) => ErrorKind::Document,
            Self::Settings(_) => ErrorKind::Config,
        }
    }
}
