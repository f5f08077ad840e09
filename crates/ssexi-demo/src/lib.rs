//! # ssexi-demo
//!
//! A small server that speaks the SSEXI protocol.
//!
//! - `GET /` serves a page with a live region and a todo form
//! - `GET /website-logic` is the push stream (`text/event-stream`)
//! - `POST /todo` accepts the multipart todo form

#![deny(unsafe_code)]

pub mod config;
pub mod server;
pub mod updates;

pub use config::DemoConfig;
pub use server::{AppState, DemoServer, INDEX_HTML};
