//! The reactive runtime.
//!
//! [`Runtime`] owns the document, the observer bus, the binding table and
//! the connection registry, and processes one [`RuntimeEvent`] at a time.
//! Everything that waits (push streams, form posts, reconnect timers) runs
//! on a spawned task and reports back through the runtime's queue.
//!
//! Methods that open connections or spawn tasks must be called from within
//! a Tokio runtime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use ssexi_core::{Document, NodeId};
use ssexi_events::{EventBus, LifecycleEvent, LifecycleObserver};
use ssexi_settings::SsexiSettings;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};

use crate::attrs::AttributeNames;
use crate::binding::{BindingKind, BindingTable};
use crate::errors::{Result, RuntimeError};
use crate::form::{SubmissionOutcome, resets_after_success, spawn_submission};
use crate::interpreter::Interpreter;
use crate::protocol::parse_frame;
use crate::registry::ConnectionRegistry;
use crate::scanner;
use crate::script::{GlobalScope, ScriptHost};
use crate::session::{SessionId, SessionState};
use crate::transport::http::HttpTransport;
use crate::transport::{FormTransport, PushTransport, SessionSink};

/// Something the runtime must react to.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A push connection opened.
    Opened {
        /// Reporting session.
        session: SessionId,
    },
    /// A push frame arrived.
    Frame {
        /// Reporting session.
        session: SessionId,
        /// Raw frame text.
        data: String,
    },
    /// A push connection failed or ended.
    TransportError {
        /// Reporting session.
        session: SessionId,
        /// Failure description.
        error: String,
    },
    /// A reconnect delay elapsed.
    ReconnectDue {
        /// Connect node whose session failed.
        owner: NodeId,
        /// Endpoint to reopen.
        endpoint: String,
    },
    /// A form post finished.
    SubmissionDone {
        /// Submitted form.
        form: NodeId,
        /// Submission number returned by [`Runtime::submit`].
        submission: u64,
        /// Endpoint posted to.
        endpoint: String,
        /// Result.
        outcome: SubmissionOutcome,
    },
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    document: Document,
    settings: Option<SsexiSettings>,
    bus: EventBus,
    scripts: Option<Box<dyn ScriptHost>>,
    push: Option<Arc<dyn PushTransport>>,
    forms: Option<Arc<dyn FormTransport>>,
}

impl RuntimeBuilder {
    /// Use these settings instead of the global ones.
    #[must_use]
    pub fn settings(mut self, settings: SsexiSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Use an existing bus.
    #[must_use]
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Register an observer.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.bus.registry_mut().register(observer);
        self
    }

    /// Script host. Defaults to a fresh [`GlobalScope`].
    #[must_use]
    pub fn script_host(mut self, host: impl ScriptHost + 'static) -> Self {
        self.scripts = Some(Box::new(host));
        self
    }

    /// Push transport. Defaults to [`HttpTransport`].
    #[must_use]
    pub fn push_transport(mut self, transport: Arc<dyn PushTransport>) -> Self {
        self.push = Some(transport);
        self
    }

    /// Form transport. Defaults to [`HttpTransport`].
    #[must_use]
    pub fn form_transport(mut self, transport: Arc<dyn FormTransport>) -> Self {
        self.forms = Some(transport);
        self
    }

    /// Validate settings and assemble the runtime.
    pub fn build(self) -> Result<Runtime> {
        let settings = self
            .settings
            .unwrap_or_else(|| ssexi_settings::get_settings().clone());
        settings.validate()?;

        let (push, forms) = match (self.push, self.forms) {
            (Some(push), Some(forms)) => (push, forms),
            (push, forms) => {
                let http = Arc::new(HttpTransport::new(&settings.transport)?);
                (
                    push.unwrap_or_else(|| Arc::clone(&http) as Arc<dyn PushTransport>),
                    forms.unwrap_or_else(|| http as Arc<dyn FormTransport>),
                )
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Runtime {
            names: AttributeNames::new(&settings.runtime.attribute_prefix),
            reconnect_delay: Duration::from_millis(settings.runtime.reconnect_delay_ms),
            settings,
            document: self.document,
            bus: self.bus,
            bindings: BindingTable::new(),
            registry: ConnectionRegistry::new(),
            scripts: self
                .scripts
                .unwrap_or_else(|| Box::new(GlobalScope::new())),
            push,
            forms,
            tx,
            rx,
            pending_reconnects: HashMap::new(),
            submissions: 0,
            torn_down: false,
        })
    }
}

/// Client-side reactive runtime.
pub struct Runtime {
    settings: SsexiSettings,
    names: AttributeNames,
    reconnect_delay: Duration,
    document: Document,
    bus: EventBus,
    bindings: BindingTable,
    registry: ConnectionRegistry,
    scripts: Box<dyn ScriptHost>,
    push: Arc<dyn PushTransport>,
    forms: Arc<dyn FormTransport>,
    tx: mpsc::UnboundedSender<RuntimeEvent>,
    rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    pending_reconnects: HashMap<NodeId, (String, AbortHandle)>,
    submissions: u64,
    torn_down: bool,
}

impl Runtime {
    /// Start building a runtime around `document`.
    pub fn builder(document: Document) -> RuntimeBuilder {
        RuntimeBuilder {
            document,
            settings: None,
            bus: EventBus::new(),
            scripts: None,
            push: None,
            forms: None,
        }
    }

    // ── Binding ─────────────────────────────────────────────────────────

    /// Bind everything under `<body>` (or the whole document without one).
    pub fn start(&mut self) {
        let root = self.document.body().unwrap_or_else(|| self.document.root());
        info!(%root, "starting runtime");
        self.process(root);
    }

    /// Scan `node` and its subtree and bind every new connect node and form.
    /// Already bound nodes are left alone.
    pub fn process(&mut self, node: NodeId) {
        if self.torn_down {
            return;
        }
        let found = scanner::scan(&self.document, node, &self.names);
        trace!(%node, connect = found.connect.len(), post = found.post.len(), "scanned");
        for connect in found.connect {
            self.bind_connect(connect);
        }
        for form in found.post {
            self.bind_form(form);
        }
    }

    /// Notify the runtime that `node` was inserted into the document.
    pub fn subtree_inserted(&mut self, node: NodeId) {
        self.process(node);
    }

    fn bind_connect(&mut self, node: NodeId) {
        if self.bindings.is_bound(node, BindingKind::Connect) {
            return;
        }
        let Some(endpoint) = self.trigger(node, BindingKind::Connect) else {
            return;
        };
        if !self.notify(node, LifecycleEvent::Init, json!({ "endpoint": endpoint })) {
            debug!(%node, endpoint = %endpoint, "init vetoed");
            return;
        }

        let _ = self.bindings.bind(node, BindingKind::Connect, &endpoint);
        let session = self.open_session(node, &endpoint);
        let _ = self.notify(
            node,
            LifecycleEvent::Initialized,
            json!({ "endpoint": endpoint, "session": session }),
        );
    }

    fn bind_form(&mut self, node: NodeId) {
        if self.bindings.is_bound(node, BindingKind::PostSubmit) {
            return;
        }
        let Some(endpoint) = self.trigger(node, BindingKind::PostSubmit) else {
            return;
        };
        if !self.notify(node, LifecycleEvent::FormInit, json!({ "endpoint": endpoint })) {
            debug!(%node, endpoint = %endpoint, "form-init vetoed");
            return;
        }

        let _ = self.bindings.bind(node, BindingKind::PostSubmit, &endpoint);
        debug!(%node, endpoint = %endpoint, "form bound");
        let _ = self.notify(
            node,
            LifecycleEvent::FormInitialized,
            json!({ "endpoint": endpoint }),
        );
    }

    fn trigger(&self, node: NodeId, kind: BindingKind) -> Option<String> {
        let attr = match kind {
            BindingKind::Connect => &self.names.connect,
            BindingKind::PostSubmit => &self.names.post,
        };
        self.document
            .attr(node, attr)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
    }

    fn open_session(&mut self, owner: NodeId, endpoint: &str) -> SessionId {
        let push = Arc::clone(&self.push);
        let tx = self.tx.clone();
        self.registry.acquire(endpoint, owner, |id| {
            push.open(endpoint, SessionSink::new(id, tx))
        })
    }

    fn notify(&self, node: NodeId, event: LifecycleEvent, detail: Value) -> bool {
        self.bus.notify(&self.document, node, event, detail)
    }

    // ── Forms ───────────────────────────────────────────────────────────

    /// Submit a bound form.
    ///
    /// Returns the submission number, or `None` when an observer vetoed
    /// `form-submit`. The outcome arrives later as a
    /// [`RuntimeEvent::SubmissionDone`]. Fails with
    /// [`RuntimeError::TornDown`] once [`teardown`](Self::teardown) ran.
    pub fn submit(&mut self, form: NodeId) -> Result<Option<u64>> {
        if self.torn_down {
            return Err(RuntimeError::TornDown);
        }
        let endpoint = self
            .bindings
            .get(form, BindingKind::PostSubmit)
            .ok_or(RuntimeError::NotBound(form))?
            .endpoint
            .clone();

        if !self.notify(form, LifecycleEvent::FormSubmit, json!({ "endpoint": endpoint })) {
            debug!(%form, endpoint = %endpoint, "form-submit vetoed");
            return Ok(None);
        }

        let fields = self.document.form_fields(form)?;
        self.submissions += 1;
        let submission = self.submissions;
        spawn_submission(
            Arc::clone(&self.forms),
            self.tx.clone(),
            form,
            submission,
            endpoint,
            fields,
        );
        Ok(Some(submission))
    }

    // ── Event loop ──────────────────────────────────────────────────────

    /// React to one event.
    pub fn handle(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Opened { session } => self.on_open(session),
            RuntimeEvent::Frame { session, data } => self.on_frame(session, &data),
            RuntimeEvent::TransportError { session, error } => {
                self.on_transport_error(session, &error);
            }
            RuntimeEvent::ReconnectDue { owner, endpoint } => {
                self.on_reconnect_due(owner, &endpoint);
            }
            RuntimeEvent::SubmissionDone {
                form,
                submission,
                endpoint,
                outcome,
            } => self.on_submission_done(form, submission, &endpoint, outcome),
        }
    }

    /// Wait for the next event without handling it.
    pub async fn next_event(&mut self) -> Option<RuntimeEvent> {
        self.rx.recv().await
    }

    /// Wait for one event and handle it.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Handle every event already queued, without waiting. Returns how many
    /// were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Handle events until `shutdown` completes, then tear down.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                event = self.rx.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }
        self.teardown();
    }

    fn on_open(&mut self, session: SessionId) {
        let Some(current) = self.registry.find_mut(session) else {
            trace!(%session, "open from stale session ignored");
            return;
        };
        current.set_state(SessionState::Open);
        let owner = current.owner();
        let endpoint = current.endpoint().to_string();
        debug!(%session, endpoint = %endpoint, "connected");
        let _ = self.notify(owner, LifecycleEvent::Connected, json!({ "endpoint": endpoint }));
    }

    fn on_frame(&mut self, session: SessionId, data: &str) {
        let Some(current) = self.registry.find(session) else {
            trace!(%session, "frame from stale session ignored");
            return;
        };
        let owner = current.owner();
        let endpoint = current.endpoint().to_string();

        let message = match parse_frame(data) {
            Ok(message) => message,
            Err(e) => {
                warn!(%session, endpoint = %endpoint, error = %e, "dropping malformed frame");
                let _ = self.notify(
                    owner,
                    LifecycleEvent::ParseError,
                    json!({ "endpoint": endpoint, "error": e.to_string(), "data": data }),
                );
                return;
            }
        };

        let update = message.to_json();
        if !self.notify(
            owner,
            LifecycleEvent::Message,
            json!({ "endpoint": endpoint, "update": update }),
        ) {
            debug!(%session, "message vetoed");
            return;
        }

        let inserted = Interpreter {
            document: &mut self.document,
            bus: &self.bus,
            scripts: &mut *self.scripts,
            policy: &self.settings.scripts,
        }
        .apply(owner, &message);
        for node in inserted {
            self.subtree_inserted(node);
        }

        let _ = self.notify(
            owner,
            LifecycleEvent::Processed,
            json!({ "endpoint": endpoint, "update": update }),
        );
    }

    fn on_transport_error(&mut self, session: SessionId, error: &str) {
        let Some(current) = self.registry.find(session) else {
            trace!(%session, "error from stale session ignored");
            return;
        };
        let owner = current.owner();
        let endpoint = current.endpoint().to_string();
        let err = RuntimeError::Connection {
            endpoint: endpoint.clone(),
            message: error.to_string(),
        };
        warn!(%session, error = %err, "push connection failed");

        let _ = self.notify(
            owner,
            LifecycleEvent::Error,
            json!({ "endpoint": endpoint, "kind": err.kind(), "error": error }),
        );
        let _ = self.registry.release_session(session);
        self.schedule_reconnect(owner, endpoint);
    }

    fn schedule_reconnect(&mut self, owner: NodeId, endpoint: String) {
        if self.torn_down {
            return;
        }
        let delay = self.reconnect_delay;
        let tx = self.tx.clone();
        let due = RuntimeEvent::ReconnectDue {
            owner,
            endpoint: endpoint.clone(),
        };
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(due);
        });
        debug!(%owner, endpoint = %endpoint, delay_ms = delay.as_millis(), "reconnect scheduled");
        if let Some((_, previous)) = self
            .pending_reconnects
            .insert(owner, (endpoint, task.abort_handle()))
        {
            previous.abort();
        }
    }

    fn on_reconnect_due(&mut self, owner: NodeId, endpoint: &str) {
        let _ = self.pending_reconnects.remove(&owner);
        if self.torn_down {
            return;
        }
        if !self.document.is_attached(owner)
            || scanner::is_ignored(&self.document, owner, &self.names)
            || !self.bindings.is_bound(owner, BindingKind::Connect)
        {
            debug!(%owner, endpoint, "reconnect abandoned");
            return;
        }
        if !self.notify(owner, LifecycleEvent::Reconnect, json!({ "endpoint": endpoint })) {
            debug!(%owner, endpoint, "reconnect vetoed");
            return;
        }
        let session = self.open_session(owner, endpoint);
        info!(%owner, endpoint, %session, "reconnecting");
    }

    fn on_submission_done(
        &mut self,
        form: NodeId,
        submission: u64,
        endpoint: &str,
        outcome: SubmissionOutcome,
    ) {
        match outcome {
            SubmissionOutcome::Success(response) => {
                debug!(%form, submission, status = response.status, "form posted");
                let _ = self.notify(
                    form,
                    LifecycleEvent::FormSuccess,
                    json!({
                        "endpoint": endpoint,
                        "submission": submission,
                        "status": response.status,
                        "body": response.body,
                    }),
                );
                if resets_after_success(self.document.attr(form, &self.names.swap)) {
                    if let Err(e) = self.document.reset_form(form) {
                        warn!(%form, error = %e, "form reset failed");
                    }
                }
            }
            SubmissionOutcome::Rejected(response) => {
                self.report_submission_error(
                    form,
                    submission,
                    endpoint,
                    &format!("HTTP {}", response.status),
                    Some(response.status),
                );
            }
            SubmissionOutcome::Failed(error) => {
                self.report_submission_error(form, submission, endpoint, &error, None);
            }
        }
    }

    fn report_submission_error(
        &self,
        form: NodeId,
        submission: u64,
        endpoint: &str,
        message: &str,
        status: Option<u16>,
    ) {
        let err = RuntimeError::Submission {
            endpoint: endpoint.to_string(),
            message: message.to_string(),
        };
        warn!(%form, submission, error = %err, "form post failed");
        let _ = self.notify(
            form,
            LifecycleEvent::FormError,
            json!({
                "endpoint": endpoint,
                "submission": submission,
                "kind": err.kind(),
                "error": message,
                "status": status,
            }),
        );
    }

    // ── Teardown ────────────────────────────────────────────────────────

    /// Close every session and abandon pending reconnects. Further scans and
    /// reconnects are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let closed = self.registry.release_all();
        let abandoned = self.pending_reconnects.len();
        for (_, (_, handle)) in self.pending_reconnects.drain() {
            handle.abort();
        }
        info!(closed, abandoned, "runtime torn down");
    }

    /// Close sessions and drop bindings of nodes that are no longer
    /// attached. Returns the number of nodes collected.
    pub fn collect_detached(&mut self) -> usize {
        let detached: Vec<NodeId> = self
            .bindings
            .nodes()
            .into_iter()
            .filter(|&n| !self.document.is_attached(n))
            .collect();
        for &node in &detached {
            let _ = self.bindings.unbind(node);
            let _ = self.registry.release_owned_by(node);
            if let Some((_, handle)) = self.pending_reconnects.remove(&node) {
                handle.abort();
            }
        }
        if !detached.is_empty() {
            debug!(count = detached.len(), "collected detached bindings");
        }
        detached.len()
    }

    // ── Inspection ──────────────────────────────────────────────────────

    /// The live document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access to the document. Call [`subtree_inserted`](Self::subtree_inserted)
    /// for nodes added through it.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Notification bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Mutable bus access, for registering observers.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Connection registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Binding table.
    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Effective settings.
    pub fn settings(&self) -> &SsexiSettings {
        &self.settings
    }

    /// Attribute names in use.
    pub fn attribute_names(&self) -> &AttributeNames {
        &self.names
    }

    /// State of the session for `endpoint`, including a pending reconnect.
    pub fn session_state(&self, endpoint: &str) -> Option<SessionState> {
        if let Some(session) = self.registry.get(endpoint) {
            return Some(session.state());
        }
        self.pending_reconnects
            .values()
            .any(|(e, _)| e == endpoint)
            .then_some(SessionState::ReconnectScheduled)
    }

    /// Whether a reconnect is pending for `owner`.
    pub fn reconnect_pending(&self, owner: NodeId) -> bool {
        self.pending_reconnects.contains_key(&owner)
    }

    /// Whether [`teardown`](Self::teardown) ran.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("bindings", &self.bindings.len())
            .field("sessions", &self.registry.len())
            .field("pending_reconnects", &self.pending_reconnects.len())
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}
