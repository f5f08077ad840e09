//! Notification dispatch.
//!
//! The [`EventBus`] delivers a [`Notification`] to every matching observer.
//! Delivery order: scoped observers on the target, then on each ancestor
//! outward to the root, then document-wide observers. Within one scope,
//! observers run by priority (highest first).
//!
//! Every observer sees the notification, even after a veto; a veto only
//! decides the return value. Observer errors are logged and do not affect
//! the outcome.

use serde_json::Value;
use ssexi_core::{Document, NodeId};
use tracing::{debug, trace, warn};

use crate::registry::ObserverRegistry;
use crate::types::{LifecycleEvent, Notification, Verdict};

/// Lifecycle notification dispatcher.
#[derive(Debug, Default)]
pub struct EventBus {
    registry: ObserverRegistry,
}

impl EventBus {
    /// Create a bus with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ObserverRegistry::new(),
        }
    }

    /// Create a bus around an existing registry.
    #[must_use]
    pub fn with_registry(registry: ObserverRegistry) -> Self {
        Self { registry }
    }

    /// The observer registry.
    #[must_use]
    pub fn registry(&self) -> &ObserverRegistry {
        &self.registry
    }

    /// Mutable access to the observer registry.
    pub fn registry_mut(&mut self) -> &mut ObserverRegistry {
        &mut self.registry
    }

    /// Deliver a notification and return whether the step may proceed.
    ///
    /// Returns `false` only for a cancelable event that at least one
    /// observer vetoed.
    pub fn notify(
        &self,
        document: &Document,
        target: NodeId,
        event: LifecycleEvent,
        detail: Value,
    ) -> bool {
        let observers = self.registry.observers_for(event);
        trace!(%event, %target, observers = observers.len(), "notify");
        if observers.is_empty() {
            return true;
        }

        let mut notification = Notification {
            event,
            target,
            current: None,
            detail,
        };
        let mut veto: Option<String> = None;

        let scopes = document
            .ancestors_inclusive(target)
            .map(Some)
            .chain(std::iter::once(None));
        for scope in scopes {
            notification.current = scope;
            for observer in observers.iter().filter(|o| o.scope() == scope) {
                match observer.observe(&notification, document) {
                    Ok(Verdict::Continue) => {}
                    Ok(Verdict::Veto(reason)) => {
                        if veto.is_none() {
                            veto = Some(format!("{}: {reason}", observer.name()));
                        }
                    }
                    Err(e) => {
                        warn!(
                            observer = observer.name(),
                            %event,
                            error = %e,
                            "observer failed, continuing"
                        );
                    }
                }
            }
        }

        match veto {
            Some(reason) if event.is_cancelable() => {
                debug!(%event, %target, reason = %reason, "step vetoed");
                false
            }
            Some(reason) => {
                debug!(%event, %target, reason = %reason, "veto ignored on non-cancelable event");
                true
            }
            None => true,
        }
    }
}
