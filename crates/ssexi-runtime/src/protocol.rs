//! Update frame decoding.
//!
//! A frame is a JSON object with two optional groups:
//!
//! ```json
//! { "js":   { "counterValue": 5, "exec": "console.log(counterValue)" },
//!   "html": { "counter": "<div id=\"counter\">5</div>" } }
//! ```
//!
//! `js` keys other than `exec` are global assignments. `html` keys name the
//! target node. Key order is declaration order. `null` groups count as
//! absent and unknown top-level keys are ignored.
//!
//! Only the frame's shape can fail decoding. A non-string `exec` or markup
//! value is kept as its own instruction and fails when applied, without
//! taking the rest of the frame down with it.

use serde_json::{Map, Value};
use thiserror::Error;

/// Key of the code instruction inside the `js` group.
pub const EXEC_KEY: &str = "exec";

/// Frame decoding failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The frame is not JSON.
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame is JSON but not an object.
    #[error("frame must be a JSON object")]
    NotAnObject,

    /// `js` or `html` is neither an object nor `null`.
    #[error("'{0}' group must be an object")]
    GroupNotObject(&'static str),

    /// The `exec` value is not a string.
    #[error("'exec' must be a string")]
    ExecNotString,

    /// A fragment value is not a string.
    #[error("markup for '{0}' must be a string")]
    MarkupNotString(String),
}

/// One script instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptInstruction {
    /// Run code in the host's global context.
    Execute(String),
    /// Bind a value to a named global.
    Assign {
        /// Global name.
        name: String,
        /// Literal value.
        value: Value,
    },
    /// An `exec` whose value is not code.
    InvalidExec(Value),
}

/// One fragment instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentInstruction {
    /// `id` of the node to patch.
    pub target: String,
    /// Replacement markup as received; its root element's children become
    /// the target's. Only a string is usable.
    pub markup: Value,
}

impl FragmentInstruction {
    /// Markup text, or [`ParseError::MarkupNotString`].
    pub fn html(&self) -> Result<&str, ParseError> {
        self.markup
            .as_str()
            .ok_or_else(|| ParseError::MarkupNotString(self.target.clone()))
    }
}

/// A decoded frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateMessage {
    /// Script instructions in declaration order.
    pub scripts: Vec<ScriptInstruction>,
    /// Fragment instructions in declaration order.
    pub fragments: Vec<FragmentInstruction>,
}

impl UpdateMessage {
    /// Whether the frame carries no instruction.
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.fragments.is_empty()
    }

    /// Re-encode as a frame object, for event details.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        if !self.scripts.is_empty() {
            let js: Map<String, Value> = self
                .scripts
                .iter()
                .map(|s| match s {
                    ScriptInstruction::Execute(code) => {
                        (EXEC_KEY.to_string(), Value::String(code.clone()))
                    }
                    ScriptInstruction::Assign { name, value } => (name.clone(), value.clone()),
                    ScriptInstruction::InvalidExec(value) => (EXEC_KEY.to_string(), value.clone()),
                })
                .collect();
            let _ = out.insert("js".to_string(), Value::Object(js));
        }
        if !self.fragments.is_empty() {
            let html: Map<String, Value> = self
                .fragments
                .iter()
                .map(|f| (f.target.clone(), f.markup.clone()))
                .collect();
            let _ = out.insert("html".to_string(), Value::Object(html));
        }
        Value::Object(out)
    }
}

/// Decode one frame.
pub fn parse_frame(data: &str) -> Result<UpdateMessage, ParseError> {
    let value: Value = serde_json::from_str(data)?;
    let Value::Object(frame) = value else {
        return Err(ParseError::NotAnObject);
    };

    let mut message = UpdateMessage::default();

    if let Some(js) = group(&frame, "js")? {
        for (key, value) in js {
            let instruction = match value {
                Value::String(code) if key == EXEC_KEY => ScriptInstruction::Execute(code.clone()),
                _ if key == EXEC_KEY => ScriptInstruction::InvalidExec(value.clone()),
                _ => ScriptInstruction::Assign {
                    name: key.clone(),
                    value: value.clone(),
                },
            };
            message.scripts.push(instruction);
        }
    }

    if let Some(html) = group(&frame, "html")? {
        for (target, markup) in html {
            message.fragments.push(FragmentInstruction {
                target: target.clone(),
                markup: markup.clone(),
            });
        }
    }

    Ok(message)
}

fn group<'a>(
    frame: &'a Map<String, Value>,
    name: &'static str,
) -> Result<Option<&'a Map<String, Value>>, ParseError> {
    match frame.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ParseError::GroupNotObject(name)),
    }
}
