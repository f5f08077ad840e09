//! Observer registry.
//!
//! Maintains a priority-sorted collection of [`LifecycleObserver`] instances
//! per [`LifecycleEvent`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::observer::LifecycleObserver;
use crate::types::{LifecycleEvent, ObserverInfo};

/// Registry of lifecycle observers.
///
/// Observers are bucketed by event and sorted by priority (descending)
/// within each bucket. Registration order breaks ties.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: HashMap<LifecycleEvent, Vec<Arc<dyn LifecycleObserver>>>,
}

impl ObserverRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
        }
    }

    /// Register an observer for every event it declares.
    ///
    /// An observer with the same name is replaced.
    pub fn register(&mut self, observer: Arc<dyn LifecycleObserver>) {
        let name = observer.name().to_string();
        let _ = self.unregister(&name);

        debug!(
            name = %name,
            events = observer.events().len(),
            priority = observer.priority(),
            scoped = observer.scope().is_some(),
            "registering observer"
        );
        for &event in observer.events() {
            let bucket = self.observers.entry(event).or_default();
            bucket.push(Arc::clone(&observer));
            bucket.sort_by_key(|o| std::cmp::Reverse(o.priority()));
        }
    }

    /// Unregister an observer by name. Returns `true` if one was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let mut found = false;
        for bucket in self.observers.values_mut() {
            let before = bucket.len();
            bucket.retain(|o| o.name() != name);
            found |= bucket.len() < before;
        }
        self.observers.retain(|_, bucket| !bucket.is_empty());
        if found {
            debug!(name = %name, "unregistered observer");
        }
        found
    }

    /// Observers for an event, highest priority first.
    #[must_use]
    pub fn observers_for(&self, event: LifecycleEvent) -> &[Arc<dyn LifecycleObserver>] {
        self.observers.get(&event).map_or(&[], Vec::as_slice)
    }

    /// Information about all registered observers, sorted by name.
    #[must_use]
    pub fn list_all(&self) -> Vec<ObserverInfo> {
        let mut seen: HashMap<String, ObserverInfo> = HashMap::new();
        for bucket in self.observers.values() {
            for o in bucket {
                let _ = seen.entry(o.name().to_string()).or_insert_with(|| ObserverInfo {
                    name: o.name().to_string(),
                    events: o.events().to_vec(),
                    priority: o.priority(),
                    scope: o.scope(),
                });
            }
        }
        let mut infos: Vec<ObserverInfo> = seen.into_values().collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Number of distinct registered observers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.list_all().len()
    }

    /// Remove every observer.
    pub fn clear(&mut self) {
        self.observers.clear();
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observer_count", &self.count())
            .finish()
    }
}
