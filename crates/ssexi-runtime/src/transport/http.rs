//! HTTP transport built on `reqwest`.
//!
//! Push sessions are `GET` requests whose `text/event-stream` body is
//! decoded by [`parse_sse_events`](super::sse::parse_sse_events); each runs
//! in its own Tokio task and is closed by aborting that task. Form posts
//! are `multipart/form-data` requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use ssexi_settings::TransportSettings;
use tokio::task::AbortHandle;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use super::sse::parse_sse_events;
use super::{
    ConnectionHandle, FormResponse, FormTransport, PushTransport, SessionSink, TransportError,
};

/// HTTP push and form transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<String>,
    submit_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport from settings.
    pub fn new(settings: &TransportSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            submit_timeout: Duration::from_millis(settings.submit_timeout_ms),
        })
    }

    /// Use an existing client.
    pub fn with_client(client: reqwest::Client, base_url: Option<String>) -> Self {
        Self {
            client,
            base_url,
            submit_timeout: Duration::from_millis(TransportSettings::default().submit_timeout_ms),
        }
    }

    /// Resolve an endpoint to an absolute URL.
    ///
    /// Absolute `http(s)` endpoints are used as is; anything else is joined
    /// onto the base URL.
    pub fn resolve(&self, endpoint: &str) -> Result<String, TransportError> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Ok(endpoint.to_string());
        }
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| TransportError::InvalidEndpoint(endpoint.to_string()))?;
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        ))
    }
}

struct TaskHandle(AbortHandle);

impl ConnectionHandle for TaskHandle {
    fn close(&mut self) {
        self.0.abort();
    }
}

impl PushTransport for HttpTransport {
    fn open(&self, endpoint: &str, sink: SessionSink) -> Box<dyn ConnectionHandle> {
        let url = self.resolve(endpoint);
        let client = self.client.clone();
        let task = tokio::spawn(run_push_stream(client, url, sink));
        Box::new(TaskHandle(task.abort_handle()))
    }
}

async fn run_push_stream(
    client: reqwest::Client,
    url: Result<String, TransportError>,
    sink: SessionSink,
) {
    let url = match url {
        Ok(url) => url,
        Err(e) => {
            sink.failed(e.to_string());
            return;
        }
    };
    debug!(session = %sink.session(), url = %url, "opening push stream");

    let response = match client
        .get(&url)
        .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            sink.failed(TransportError::Http(e).to_string());
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(session = %sink.session(), status = status.as_u16(), "push stream refused");
        sink.failed(TransportError::Status(status.as_u16()).to_string());
        return;
    }
    sink.opened();

    let events = parse_sse_events(response.bytes_stream());
    tokio::pin!(events);
    while let Some(event) = events.next().await {
        match event {
            Ok(data) => sink.frame(data),
            Err(e) => {
                sink.failed(TransportError::Http(e).to_string());
                return;
            }
        }
        if sink.is_closed() {
            return;
        }
    }
    sink.failed("stream ended");
}

#[async_trait]
impl FormTransport for HttpTransport {
    async fn submit(
        &self,
        endpoint: &str,
        fields: Vec<(String, String)>,
    ) -> Result<FormResponse, TransportError> {
        let url = self.resolve(endpoint)?;
        let form = fields
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            });

        debug!(url = %url, "posting form");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.submit_timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FormResponse { status, body })
    }
}
