//! Core types for lifecycle notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ssexi_core::NodeId;

/// Lifecycle step a notification reports.
///
/// Names follow the `sx:` event vocabulary (`sx:init`, `sx:html-updated`,
/// ...). Only the steps listed in [`is_cancelable`](Self::is_cancelable)
/// honor a veto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleEvent {
    /// A connect node is about to be bound. Cancelable.
    Init,
    /// A connect node was bound and its session created.
    Initialized,
    /// The push connection opened.
    Connected,
    /// A frame was decoded and is about to be applied. Cancelable.
    Message,
    /// A frame was applied.
    Processed,
    /// A frame could not be decoded.
    ParseError,
    /// Transport failure or a failed script instruction.
    Error,
    /// A scheduled reconnect is about to open a new session. Cancelable.
    Reconnect,
    /// A script `exec` instruction ran.
    JsExec,
    /// A global variable was assigned.
    JsVar,
    /// A fragment was patched into its target.
    HtmlUpdated,
    /// A fragment could not be applied.
    HtmlError,
    /// A form is about to be bound. Cancelable.
    FormInit,
    /// A form was bound.
    FormInitialized,
    /// A bound form is about to be posted. Cancelable.
    FormSubmit,
    /// A form post succeeded.
    FormSuccess,
    /// A form post failed.
    FormError,
}

impl LifecycleEvent {
    /// Wire name without the `sx:` prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Initialized => "initialized",
            Self::Connected => "connected",
            Self::Message => "message",
            Self::Processed => "processed",
            Self::ParseError => "parse-error",
            Self::Error => "error",
            Self::Reconnect => "reconnect",
            Self::JsExec => "js-exec",
            Self::JsVar => "js-var",
            Self::HtmlUpdated => "html-updated",
            Self::HtmlError => "html-error",
            Self::FormInit => "form-init",
            Self::FormInitialized => "form-initialized",
            Self::FormSubmit => "form-submit",
            Self::FormSuccess => "form-success",
            Self::FormError => "form-error",
        }
    }

    /// Whether a veto from an observer suppresses the step.
    #[must_use]
    pub fn is_cancelable(self) -> bool {
        matches!(
            self,
            Self::Init | Self::Message | Self::Reconnect | Self::FormInit | Self::FormSubmit
        )
    }

    /// Returns all event variants.
    #[must_use]
    pub fn all() -> &'static [LifecycleEvent] {
        &[
            Self::Init,
            Self::Initialized,
            Self::Connected,
            Self::Message,
            Self::Processed,
            Self::ParseError,
            Self::Error,
            Self::Reconnect,
            Self::JsExec,
            Self::JsVar,
            Self::HtmlUpdated,
            Self::HtmlError,
            Self::FormInit,
            Self::FormInitialized,
            Self::FormSubmit,
            Self::FormSuccess,
            Self::FormError,
        ]
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sx:{}", self.as_str())
    }
}

/// A notification as seen by observers.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Step being reported.
    pub event: LifecycleEvent,
    /// Node that owns the step (connect node, form, ...).
    pub target: NodeId,
    /// Node whose scoped observers are currently running, `None` for
    /// document-wide observers.
    pub current: Option<NodeId>,
    /// Structured step detail.
    pub detail: Value,
}

/// Observer decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the step proceed.
    Continue,
    /// Suppress the step's default processing.
    Veto(String),
}

impl Verdict {
    /// Create a veto with a reason.
    #[must_use]
    pub fn veto(reason: impl Into<String>) -> Self {
        Self::Veto(reason.into())
    }

    /// Whether this verdict vetoes the step.
    #[must_use]
    pub fn is_veto(&self) -> bool {
        matches!(self, Self::Veto(_))
    }
}

/// Summary of a registered observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverInfo {
    /// Observer name.
    pub name: String,
    /// Events the observer is registered for.
    pub events: Vec<LifecycleEvent>,
    /// Priority (higher runs first).
    pub priority: i32,
    /// Node scope, `None` for document-wide observers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_sx_prefix() {
        assert_eq!(LifecycleEvent::HtmlUpdated.to_string(), "sx:html-updated");
        assert_eq!(LifecycleEvent::ParseError.to_string(), "sx:parse-error");
    }

    #[test]
    fn serde_matches_wire_names() {
        for event in LifecycleEvent::all() {
            let json = serde_json::to_value(event).unwrap();
            assert_eq!(json, serde_json::Value::String(event.as_str().to_string()));
        }
    }

    #[test]
    fn cancelable_steps() {
        let cancelable: Vec<_> = LifecycleEvent::all()
            .iter()
            .copied()
            .filter(|e| e.is_cancelable())
            .collect();
        assert_eq!(
            cancelable,
            vec![
                LifecycleEvent::Init,
                LifecycleEvent::Message,
                LifecycleEvent::Reconnect,
                LifecycleEvent::FormInit,
                LifecycleEvent::FormSubmit,
            ]
        );
    }

    #[test]
    fn verdict_helpers() {
        assert!(Verdict::veto("no").is_veto());
        assert!(!Verdict::Continue.is_veto());
    }
}
