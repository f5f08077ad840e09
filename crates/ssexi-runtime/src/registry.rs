//! Connection registry.
//!
//! Holds at most one live [`Session`] per endpoint string. The registry is a
//! plain value owned by the runtime; nothing about it is process-global.

use std::collections::HashMap;

use ssexi_core::NodeId;
use tracing::debug;

use crate::session::{SessionId, SessionState};
use crate::transport::ConnectionHandle;

/// One push connection to one endpoint.
pub struct Session {
    id: SessionId,
    endpoint: String,
    owner: NodeId,
    state: SessionState,
    handle: Box<dyn ConnectionHandle>,
}

impl Session {
    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Endpoint string as declared on the owner.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Connect node that opened the session.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    fn close(&mut self) {
        self.handle.close();
        self.state = SessionState::Closed;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("owner", &self.owner)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Sessions by endpoint.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: HashMap<String, Session>,
    next_id: u64,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session for `endpoint`, closing and evicting the current
    /// one first.
    ///
    /// `open` receives the new session's id and returns its connection
    /// handle. Returns the new id.
    pub fn acquire<F>(&mut self, endpoint: &str, owner: NodeId, open: F) -> SessionId
    where
        F: FnOnce(SessionId) -> Box<dyn ConnectionHandle>,
    {
        if let Some(mut previous) = self.sessions.remove(endpoint) {
            debug!(endpoint, superseded = %previous.id, "closing previous session");
            previous.close();
        }

        self.next_id += 1;
        let id = SessionId(self.next_id);
        let handle = open(id);
        let _ = self.sessions.insert(
            endpoint.to_string(),
            Session {
                id,
                endpoint: endpoint.to_string(),
                owner,
                state: SessionState::Connecting,
                handle,
            },
        );
        debug!(endpoint, session = %id, %owner, "session acquired");
        id
    }

    /// Close and remove the session for `endpoint`.
    pub fn release(&mut self, endpoint: &str) -> bool {
        match self.sessions.remove(endpoint) {
            Some(mut session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Close and remove the session with this id, if it is still current.
    pub fn release_session(&mut self, id: SessionId) -> Option<Session> {
        let endpoint = self.find(id)?.endpoint.clone();
        let mut session = self.sessions.remove(&endpoint)?;
        session.close();
        Some(session)
    }

    /// Close and remove every session opened by `owner`.
    pub fn release_owned_by(&mut self, owner: NodeId) -> usize {
        let endpoints: Vec<String> = self
            .sessions
            .values()
            .filter(|s| s.owner == owner)
            .map(|s| s.endpoint.clone())
            .collect();
        endpoints.iter().filter(|e| self.release(e)).count()
    }

    /// Close and remove every session.
    pub fn release_all(&mut self) -> usize {
        let count = self.sessions.len();
        for (_, mut session) in self.sessions.drain() {
            session.close();
        }
        if count > 0 {
            debug!(count, "released all sessions");
        }
        count
    }

    /// Current session for an endpoint.
    pub fn get(&self, endpoint: &str) -> Option<&Session> {
        self.sessions.get(endpoint)
    }

    /// Current session with this id. Superseded and closed sessions are not
    /// found.
    pub fn find(&self, id: SessionId) -> Option<&Session> {
        self.sessions.values().find(|s| s.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.values_mut().find(|s| s.id == id)
    }

    /// Endpoints with a session, sorted.
    pub fn endpoints(&self) -> Vec<&str> {
        let mut endpoints: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        endpoints.sort_unstable();
        endpoints
    }

    /// All sessions.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
