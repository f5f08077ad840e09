//! # ssexi-core
//!
//! Foundation types for the SSEXI reactive runtime.
//!
//! - **Document model**: arena-backed [`Document`] with generational
//!   [`NodeId`] handles. Side tables keyed by `NodeId` stay valid after the
//!   node is detached, and a freed slot never aliases an old handle.
//! - **Markup**: full-page and fragment parsing through `scraper`, plus HTML
//!   serialization for inspection.
//! - **Forms**: live control values, field encoding and reset.
//! - **Errors**: [`DomError`] for structural failures.
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` stack.

#![deny(unsafe_code)]

pub mod dom;
pub mod errors;
pub mod form;
pub mod logging;
pub mod markup;

pub use dom::{Document, Element, NodeId, NodeKind};
pub use errors::{DomError, Result};
