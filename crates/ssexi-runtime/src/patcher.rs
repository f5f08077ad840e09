//! Fragment patcher.
//!
//! Replaces the content and attributes of a live node with those of a
//! parsed fragment's root element while keeping the live node itself, and
//! its `id`, in place. The fragment's children are moved, not copied, so
//! the caller can hand them to the scanner as a freshly inserted subtree.
//! The replaced content and the emptied fragment shell are freed, so handles
//! into them go stale and repeated patches do not grow the arena.

use ssexi_core::{Document, NodeId, NodeKind};

use crate::errors::{Result, RuntimeError};

/// Result of a successful patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// The patched node.
    pub target: NodeId,
    /// Nodes moved under the target, in order.
    pub inserted: Vec<NodeId>,
}

/// Patch the attached element whose `id` is `target_id` with `markup`.
///
/// Fails with [`RuntimeError::TargetMissing`] when no such element exists and
/// with [`RuntimeError::EmptyFragment`] when the markup has no root element.
/// The document is untouched on failure.
pub fn patch(doc: &mut Document, target_id: &str, markup: &str) -> Result<PatchOutcome> {
    let target = doc
        .get_element_by_id(target_id)
        .ok_or_else(|| RuntimeError::TargetMissing(target_id.to_string()))?;

    let top_level = doc.parse_fragment(markup);
    let Some(root) = top_level
        .iter()
        .copied()
        .find(|&n| matches!(doc.kind(n), Some(NodeKind::Element(_))))
    else {
        free_all(doc, &top_level)?;
        return Err(RuntimeError::EmptyFragment(target_id.to_string()));
    };

    let preserved_id = doc.attr(target, "id").map(str::to_string);
    let mut attrs: Vec<(String, String)> = Vec::new();
    if let Some(id) = preserved_id {
        attrs.push(("id".to_string(), id));
    }
    if let Some(el) = doc.element(root) {
        attrs.extend(el.attrs().iter().filter(|(k, _)| k != "id").cloned());
    }

    let replaced = doc.take_children(target)?;
    let inserted = doc.take_children(root)?;
    for &child in &inserted {
        doc.append_child(target, child)?;
    }
    doc.replace_attributes(target, attrs)?;
    free_all(doc, &replaced)?;
    free_all(doc, &top_level)?;

    Ok(PatchOutcome { target, inserted })
}

fn free_all(doc: &mut Document, nodes: &[NodeId]) -> Result<()> {
    for &n in nodes {
        let _ = doc.remove(n)?;
    }
    Ok(())
}
