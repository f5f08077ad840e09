//! Form submission.
//!
//! A submission encodes the form's fields at submit time and posts them on
//! a spawned task; the outcome comes back to the runtime as a
//! [`RuntimeEvent::SubmissionDone`]. There is no queueing or retry, and two
//! submissions of the same form may be in flight at once.

use std::sync::Arc;

use ssexi_core::NodeId;
use tokio::sync::mpsc;
use tracing::debug;

use crate::runtime::RuntimeEvent;
use crate::transport::{FormResponse, FormTransport};

/// Value of the swap attribute that resets the form after success. An
/// absent or empty attribute means the same.
pub const SWAP_RESET: &str = "none";

/// Whether a successful submission resets the form, given its swap attribute.
pub fn resets_after_success(swap: Option<&str>) -> bool {
    match swap {
        None | Some("") => true,
        Some(policy) => policy == SWAP_RESET,
    }
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// 2xx answer.
    Success(FormResponse),
    /// Non-2xx answer.
    Rejected(FormResponse),
    /// No answer.
    Failed(String),
}

impl SubmissionOutcome {
    fn from_result(result: Result<FormResponse, String>) -> Self {
        match result {
            Ok(response) if response.is_success() => Self::Success(response),
            Ok(response) => Self::Rejected(response),
            Err(error) => Self::Failed(error),
        }
    }
}

/// Post `fields` on a spawned task and report back through `tx`.
pub(crate) fn spawn_submission(
    transport: Arc<dyn FormTransport>,
    tx: mpsc::UnboundedSender<RuntimeEvent>,
    form: NodeId,
    submission: u64,
    endpoint: String,
    fields: Vec<(String, String)>,
) {
    let _ = tokio::spawn(async move {
        debug!(%form, submission, endpoint = %endpoint, fields = fields.len(), "submitting form");
        let result = transport
            .submit(&endpoint, fields)
            .await
            .map_err(|e| e.to_string());
        let _ = tx.send(RuntimeEvent::SubmissionDone {
            form,
            submission,
            endpoint,
            outcome: SubmissionOutcome::from_result(result),
        });
    });
}
