//! Transport seams.
//!
//! The runtime never performs I/O itself. A [`PushTransport`] opens a
//! long-lived connection and reports what happens on it through a
//! [`SessionSink`]; a [`FormTransport`] posts encoded form fields. The HTTP
//! implementation of both lives in [`http`].

pub mod http;
pub mod sse;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::runtime::RuntimeEvent;
use crate::session::SessionId;

/// Transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint cannot be turned into a URL.
    #[error("invalid endpoint '{0}': relative endpoints need a base URL")]
    InvalidEndpoint(String),

    /// The peer answered the push request with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),
}

/// Handle to an open push connection.
pub trait ConnectionHandle: Send {
    /// Close the connection. Must be idempotent and never fail, even on a
    /// connection that already broke.
    fn close(&mut self);
}

/// Reports push connection activity for one session into the runtime queue.
#[derive(Debug, Clone)]
pub struct SessionSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl SessionSink {
    pub(crate) fn new(session: SessionId, tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self { session, tx }
    }

    /// Session this sink reports for.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The connection is open.
    pub fn opened(&self) {
        self.send(RuntimeEvent::Opened {
            session: self.session,
        });
    }

    /// One frame arrived.
    pub fn frame(&self, data: impl Into<String>) {
        self.send(RuntimeEvent::Frame {
            session: self.session,
            data: data.into(),
        });
    }

    /// The connection failed or ended.
    pub fn failed(&self, error: impl Into<String>) {
        self.send(RuntimeEvent::TransportError {
            session: self.session,
            error: error.into(),
        });
    }

    /// Whether the runtime stopped listening.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, event: RuntimeEvent) {
        // Dropped runtime: nothing left to report to.
        let _ = self.tx.send(event);
    }
}

/// Opens push connections.
pub trait PushTransport: Send + Sync {
    /// Start connecting to `endpoint`. Progress is reported through `sink`;
    /// the returned handle closes the connection.
    ///
    /// Called from within a Tokio runtime.
    fn open(&self, endpoint: &str, sink: SessionSink) -> Box<dyn ConnectionHandle>;
}

/// Answer to a form post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl FormResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Posts form submissions.
#[async_trait]
pub trait FormTransport: Send + Sync {
    /// Post the encoded fields to `endpoint`. Any HTTP answer is `Ok`; only
    /// failing to get one is an error.
    async fn submit(
        &self,
        endpoint: &str,
        fields: Vec<(String, String)>,
    ) -> Result<FormResponse, TransportError>;
}
