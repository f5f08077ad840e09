//! Recording observer for diagnostics and tests.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use ssexi_core::{Document, NodeId};

use crate::errors::ObserverError;
use crate::observer::LifecycleObserver;
use crate::types::{LifecycleEvent, Notification, Verdict};

/// A notification captured by an [`EventRecorder`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedEvent {
    /// Event kind.
    pub event: LifecycleEvent,
    /// Target node.
    pub target: NodeId,
    /// Detail payload.
    pub detail: Value,
}

/// Document-wide observer that records every notification it sees and
/// never vetoes.
#[derive(Debug)]
pub struct EventRecorder {
    name: String,
    events: Vec<LifecycleEvent>,
    log: Mutex<Vec<RecordedEvent>>,
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRecorder {
    /// Record every lifecycle event.
    #[must_use]
    pub fn new() -> Self {
        Self::for_events(LifecycleEvent::all())
    }

    /// Record only the listed events.
    #[must_use]
    pub fn for_events(events: &[LifecycleEvent]) -> Self {
        Self {
            name: "recorder".to_string(),
            events: events.to_vec(),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Rename the recorder so several can be registered at once.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Snapshot of everything recorded so far, in delivery order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log.lock().clone()
    }

    /// Number of recorded notifications of one kind.
    pub fn count(&self, event: LifecycleEvent) -> usize {
        self.log.lock().iter().filter(|r| r.event == event).count()
    }

    /// Most recent notification of one kind.
    pub fn last(&self, event: LifecycleEvent) -> Option<RecordedEvent> {
        self.log.lock().iter().rev().find(|r| r.event == event).cloned()
    }

    /// Event kinds in delivery order.
    pub fn sequence(&self) -> Vec<LifecycleEvent> {
        self.log.lock().iter().map(|r| r.event).collect()
    }

    /// Forget everything recorded.
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl LifecycleObserver for EventRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    fn observe(&self, notification: &Notification, _: &Document) -> Result<Verdict, ObserverError> {
        self.log.lock().push(RecordedEvent {
            event: notification.event,
            target: notification.target,
            detail: notification.detail.clone(),
        });
        Ok(Verdict::Continue)
    }
}
