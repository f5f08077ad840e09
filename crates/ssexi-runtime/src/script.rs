//! Script host capability.
//!
//! The runtime does not embed an interpreter. Script instructions are
//! handed to a [`ScriptHost`] supplied by the embedder; the default
//! [`GlobalScope`] keeps assigned globals in a map and records executed
//! code without running it.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Script instruction failures.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The capability is switched off in settings.
    #[error("script {0} is disabled")]
    Disabled(&'static str),

    /// The host failed to carry out the instruction.
    #[error("script failed: {0}")]
    Failed(String),
}

/// Host execution context for script instructions.
pub trait ScriptHost: Send {
    /// Run `code` in the global context.
    fn execute(&mut self, code: &str) -> Result<(), ScriptError>;

    /// Bind `value` to the global `name`.
    fn assign(&mut self, name: &str, value: &Value) -> Result<(), ScriptError>;
}

#[derive(Debug, Default)]
struct ScopeState {
    globals: Map<String, Value>,
    executed: Vec<String>,
}

/// Map-backed global scope.
///
/// Clones share state, so an embedder can keep a clone to read globals
/// while the runtime owns another.
#[derive(Debug, Clone, Default)]
pub struct GlobalScope {
    state: Arc<Mutex<ScopeState>>,
}

impl GlobalScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a global.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.state.lock().globals.get(name).cloned()
    }

    /// All globals in assignment order.
    pub fn globals(&self) -> Map<String, Value> {
        self.state.lock().globals.clone()
    }

    /// Code strings received, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().executed.clone()
    }
}

impl ScriptHost for GlobalScope {
    fn execute(&mut self, code: &str) -> Result<(), ScriptError> {
        debug!(len = code.len(), "exec");
        self.state.lock().executed.push(code.to_string());
        Ok(())
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), ScriptError> {
        if name.is_empty() {
            return Err(ScriptError::Failed("global name must not be empty".to_string()));
        }
        let _ = self
            .state
            .lock()
            .globals
            .insert(name.to_string(), value.clone());
        Ok(())
    }
}
