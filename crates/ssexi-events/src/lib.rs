//! # ssexi-events
//!
//! Synchronous, cancelable lifecycle notifications for the SSEXI runtime.
//!
//! Every protocol step (binding, connecting, message handling, patching,
//! form submission) is surrounded by a [`Notification`] addressed to the node
//! that owns the step. Observers registered in the [`ObserverRegistry`] see
//! the notification bubble from the target node outward through its
//! ancestors, then document-wide observers run. Any observer may veto a
//! cancelable step by returning [`Verdict::Veto`].
//!
//! ## Fail-Open
//!
//! Observer errors never abort the runtime. They are logged and treated as
//! [`Verdict::Continue`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ssexi_events::{EventBus, FnObserver, LifecycleEvent, Verdict};
//!
//! let mut bus = EventBus::new();
//! bus.registry_mut().register(Arc::new(FnObserver::new(
//!     "no-forms",
//!     &[LifecycleEvent::FormSubmit],
//!     |_, _| Ok(Verdict::veto("forms disabled")),
//! )));
//! ```

#![deny(unsafe_code)]

pub mod bus;
pub mod errors;
pub mod observer;
pub mod recorder;
pub mod registry;
pub mod types;

pub use bus::EventBus;
pub use errors::ObserverError;
pub use observer::{FnObserver, LifecycleObserver};
pub use recorder::{EventRecorder, RecordedEvent};
pub use registry::ObserverRegistry;
pub use types::{LifecycleEvent, Notification, ObserverInfo, Verdict};
