//! Binding side table.
//!
//! Bindings are keyed by [`NodeId`] and never hold the node itself, so a
//! detached node does not keep anything alive beyond its entry here. An
//! entry exists only for a node that completed binding: presence in the
//! table is the "initialized" flag that makes re-scanning a no-op.

use std::collections::HashMap;

use serde::Serialize;
use ssexi_core::NodeId;

/// Behavior attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingKind {
    /// Live region fed by a push session.
    Connect,
    /// Form posted asynchronously on submit.
    PostSubmit,
}

/// A completed binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Bound node.
    pub node: NodeId,
    /// Behavior.
    pub kind: BindingKind,
    /// Endpoint captured when the node was bound.
    pub endpoint: String,
}

/// Bindings by node and behavior.
#[derive(Debug, Default)]
pub struct BindingTable {
    entries: HashMap<(NodeId, BindingKind), Binding>,
}

impl BindingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the node already carries this behavior.
    pub fn is_bound(&self, node: NodeId, kind: BindingKind) -> bool {
        self.entries.contains_key(&(node, kind))
    }

    /// Record a binding. Returns `false` if the node was already bound.
    pub fn bind(&mut self, node: NodeId, kind: BindingKind, endpoint: &str) -> bool {
        if self.is_bound(node, kind) {
            return false;
        }
        let _ = self.entries.insert(
            (node, kind),
            Binding {
                node,
                kind,
                endpoint: endpoint.to_string(),
            },
        );
        true
    }

    /// Look up a binding.
    pub fn get(&self, node: NodeId, kind: BindingKind) -> Option<&Binding> {
        self.entries.get(&(node, kind))
    }

    /// Remove every binding of a node.
    pub fn unbind(&mut self, node: NodeId) -> Vec<Binding> {
        let keys: Vec<_> = self
            .entries
            .keys()
            .filter(|(n, _)| *n == node)
            .copied()
            .collect();
        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k))
            .collect()
    }

    /// Bound nodes, in no particular order.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.entries.keys().map(|(n, _)| *n).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// All bindings.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.values()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no node is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
