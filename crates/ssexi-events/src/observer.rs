//! Observer trait.
//!
//! Observers are registered with the [`ObserverRegistry`](crate::registry::ObserverRegistry)
//! and invoked by the [`EventBus`](crate::bus::EventBus) for every
//! notification whose event they declare.

use ssexi_core::{Document, NodeId};

use crate::errors::ObserverError;
use crate::types::{LifecycleEvent, Notification, Verdict};

/// A lifecycle observer.
///
/// # Priority
///
/// Within one scope, higher priority observers run first. Default is 0.
///
/// # Scope
///
/// A scoped observer only sees notifications whose target is the scope node
/// or one of its descendants (the notification "bubbles" through it). An
/// unscoped observer sees every notification for its events.
pub trait LifecycleObserver: Send + Sync {
    /// Unique name for this observer.
    fn name(&self) -> &str;

    /// Events this observer is registered for. Default: all.
    fn events(&self) -> &[LifecycleEvent] {
        LifecycleEvent::all()
    }

    /// Execution priority. Higher runs first. Default: 0.
    fn priority(&self) -> i32 {
        0
    }

    /// Node scope. Default: document-wide.
    fn scope(&self) -> Option<NodeId> {
        None
    }

    /// Handle a notification.
    ///
    /// Errors are logged by the bus and treated as `Continue`.
    fn observe(
        &self,
        notification: &Notification,
        document: &Document,
    ) -> Result<Verdict, ObserverError>;
}

type ObserveFn =
    dyn Fn(&Notification, &Document) -> Result<Verdict, ObserverError> + Send + Sync;

/// Closure-backed observer.
pub struct FnObserver {
    name: String,
    events: Vec<LifecycleEvent>,
    priority: i32,
    scope: Option<NodeId>,
    f: Box<ObserveFn>,
}

impl FnObserver {
    /// Create a document-wide observer for `events`.
    pub fn new<F>(name: impl Into<String>, events: &[LifecycleEvent], f: F) -> Self
    where
        F: Fn(&Notification, &Document) -> Result<Verdict, ObserverError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            events: events.to_vec(),
            priority: 0,
            scope: None,
            f: Box::new(f),
        }
    }

    /// Restrict the observer to notifications bubbling through `node`.
    #[must_use]
    pub fn scoped_to(mut self, node: NodeId) -> Self {
        self.scope = Some(node);
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl LifecycleObserver for FnObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn scope(&self) -> Option<NodeId> {
        self.scope
    }

    fn observe(
        &self,
        notification: &Notification,
        document: &Document,
    ) -> Result<Verdict, ObserverError> {
        (self.f)(notification, document)
    }
}

impl std::fmt::Debug for FnObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnObserver")
            .field("name", &self.name)
            .field("events", &self.events)
            .field("priority", &self.priority)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
