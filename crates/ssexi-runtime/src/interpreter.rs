//! Update interpreter.
//!
//! Applies a decoded [`UpdateMessage`]: script instructions first, then
//! fragment instructions, each in declaration order. Instructions are
//! independent; a failing one is reported and the rest still run.

use serde_json::json;
use ssexi_core::{Document, NodeId};
use ssexi_events::{EventBus, LifecycleEvent};
use ssexi_settings::ScriptSettings;
use tracing::{debug, warn};

use crate::errors::RuntimeError;
use crate::patcher;
use crate::protocol::{FragmentInstruction, ParseError, ScriptInstruction, UpdateMessage};
use crate::script::{ScriptError, ScriptHost};

/// Borrowed view of the runtime parts an update touches.
pub struct Interpreter<'a> {
    /// Live document.
    pub document: &'a mut Document,
    /// Notification dispatch.
    pub bus: &'a EventBus,
    /// Script capability.
    pub scripts: &'a mut dyn ScriptHost,
    /// Which script instructions may reach the host.
    pub policy: &'a ScriptSettings,
}

impl Interpreter<'_> {
    /// Apply `message` on behalf of the connect node `owner`.
    ///
    /// Returns the nodes inserted by fragment patches so the caller can
    /// scan them for new bindings.
    pub fn apply(&mut self, owner: NodeId, message: &UpdateMessage) -> Vec<NodeId> {
        for instruction in &message.scripts {
            self.run_script(owner, instruction);
        }

        let mut inserted = Vec::new();
        for fragment in &message.fragments {
            inserted.extend(self.apply_fragment(owner, fragment));
        }
        inserted
    }

    fn run_script(&mut self, owner: NodeId, instruction: &ScriptInstruction) {
        let (result, event, detail) = match instruction {
            ScriptInstruction::Execute(code) => {
                let result = if self.policy.allow_exec {
                    self.scripts.execute(code)
                } else {
                    Err(ScriptError::Disabled("execution"))
                };
                (result.map_err(RuntimeError::from), LifecycleEvent::JsExec, json!({ "code": code }))
            }
            ScriptInstruction::Assign { name, value } => {
                let result = if self.policy.allow_assign {
                    self.scripts.assign(name, value)
                } else {
                    Err(ScriptError::Disabled("assignment"))
                };
                (
                    result.map_err(RuntimeError::from),
                    LifecycleEvent::JsVar,
                    json!({ "key": name, "value": value }),
                )
            }
            ScriptInstruction::InvalidExec(value) => (
                Err(RuntimeError::from(ParseError::ExecNotString)),
                LifecycleEvent::JsExec,
                json!({ "code": value }),
            ),
        };

        match result {
            Ok(()) => {
                let _ = self.bus.notify(self.document, owner, event, detail);
            }
            Err(err) => {
                warn!(%owner, error = %err, "script instruction dropped");
                let _ = self.bus.notify(
                    self.document,
                    owner,
                    LifecycleEvent::Error,
                    json!({ "kind": err.kind(), "error": err.to_string(), "instruction": detail }),
                );
            }
        }
    }

    fn apply_fragment(&mut self, owner: NodeId, fragment: &FragmentInstruction) -> Vec<NodeId> {
        let patched = fragment
            .html()
            .map_err(RuntimeError::from)
            .and_then(|markup| patcher::patch(self.document, &fragment.target, markup));
        match patched {
            Ok(outcome) => {
                debug!(%owner, target = %fragment.target, inserted = outcome.inserted.len(), "patched");
                let _ = self.bus.notify(
                    self.document,
                    owner,
                    LifecycleEvent::HtmlUpdated,
                    json!({ "elementId": fragment.target, "node": outcome.target }),
                );
                outcome.inserted
            }
            Err(err) => {
                warn!(%owner, target = %fragment.target, error = %err, "fragment dropped");
                let _ = self.bus.notify(
                    self.document,
                    owner,
                    LifecycleEvent::HtmlError,
                    json!({ "elementId": fragment.target, "kind": err.kind(), "error": err.to_string() }),
                );
                Vec::new()
            }
        }
    }
}
