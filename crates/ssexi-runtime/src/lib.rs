//! # ssexi-runtime
//!
//! Client-side reactive runtime: binds document nodes that declare a push
//! endpoint (`sx-connect`) or an asynchronous form endpoint (`sx-post`),
//! keeps one push session per endpoint, and applies the update frames it
//! receives to the live [`Document`](ssexi_core::Document).
//!
//! ## Event loop
//!
//! [`Runtime`] processes one [`RuntimeEvent`] at a time. Network I/O and
//! reconnect timers run as spawned Tokio tasks that report back through the
//! runtime's queue, so the document is only ever touched from the task that
//! owns the runtime.
//!
//! ## Frame format
//!
//! ```json
//! { "js":   { "count": 5, "exec": "console.log(count)" },
//!   "html": { "todos": "<ul><li>milk</li></ul>" } }
//! ```
//!
//! Script instructions run first, then fragment instructions, each group in
//! declaration order. Every step is announced through the
//! [`EventBus`](ssexi_events::EventBus) and the cancelable ones can be vetoed.

#![deny(unsafe_code)]

pub mod attrs;
pub mod binding;
pub mod errors;
pub mod form;
pub mod interpreter;
pub mod patcher;
pub mod protocol;
pub mod registry;
pub mod runtime;
pub mod scanner;
pub mod script;
pub mod session;
pub mod transport;

pub use attrs::AttributeNames;
pub use binding::{Binding, BindingKind, BindingTable};
pub use errors::{ErrorKind, Result, RuntimeError};
pub use protocol::{FragmentInstruction, ParseError, ScriptInstruction, UpdateMessage, parse_frame};
pub use registry::{ConnectionRegistry, Session};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeEvent};
pub use script::{GlobalScope, ScriptError, ScriptHost};
pub use session::{SessionId, SessionState};
pub use transport::{
    ConnectionHandle, FormResponse, FormTransport, PushTransport, SessionSink, TransportError,
};
pub use transport::http::HttpTransport;
