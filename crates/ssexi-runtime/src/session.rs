//! Push session identity and state.

use std::fmt;

use serde::Serialize;

/// Identifier of one push session. Never reused within a registry, so
/// events from a superseded session can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Lifecycle state of a push session.
///
/// ```text
/// Connecting → Open → Closed
///      │         │
///      └─────────┴─→ ReconnectScheduled → Connecting (new session)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    /// Connection requested, not yet open.
    Connecting,
    /// Connection open; frames are being applied.
    Open,
    /// The connection failed and a replacement is pending.
    ReconnectScheduled,
    /// Closed by teardown, supersession or failure.
    Closed,
}

impl SessionState {
    /// Whether the session still owns a live connection.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}
