//! Arena-backed document tree.
//!
//! Every node lives in a slot of a single `Vec` owned by the [`Document`]; a
//! [`NodeId`] is a slot index plus the slot's generation. A detached node
//! keeps its handle valid until [`Document::remove`] frees its subtree. Freed
//! slots are reused with a bumped generation, so a stale handle never aliases
//! a newer node: it simply stops being [`Document::contains`]-ed and is never
//! [`Document::is_attached`]. The runtime keys binding state by `NodeId`
//! without holding onto the node itself.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::errors::{DomError, Result};

/// Stable handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Arena slot index, used for logging and event details.
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }

    /// How many times the slot had been freed when this handle was issued.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// An element: tag name, ordered attributes and live form-control state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    /// Live control value; `None` means "use the markup default".
    pub(crate) value: Option<String>,
    /// Live checkedness; `None` means "use the `checked` attribute".
    pub(crate) checked: Option<bool>,
}

impl Element {
    /// Create an element. Tag names are stored lowercase.
    pub fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
            value: None,
            checked: None,
        }
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present (even when empty).
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// All attributes in document order.
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub(crate) fn replace_attrs(&mut self, attrs: Vec<(String, String)>) {
        self.attrs = attrs;
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Exactly one per document.
    Document,
    /// An element.
    Element(Element),
    /// A text node.
    Text(String),
    /// A comment node.
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A mutable document tree.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node {
                    parent: None,
                    children: Vec::new(),
                    kind: NodeKind::Document,
                }),
            }],
            free: Vec::new(),
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: 0,
        }
    }

    /// Whether the handle refers to a live node of this document.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of arena slots, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn push(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            parent: None,
            children: Vec::new(),
            kind,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Link a freshly created, detached node under `parent` without checks.
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    // ── Construction ────────────────────────────────────────────────────

    /// Create a detached element with no attributes.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag, Vec::new())))
    }

    /// Create a detached element with attributes.
    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.push(NodeKind::Element(Element::new(tag, attrs)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Node payload.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    /// Element payload, if the node is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        match self.node_mut(id) {
            Some(Node {
                kind: NodeKind::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag_name)
    }

    /// Attribute value of an element.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    /// Whether an element carries the attribute.
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_attr(name))
    }

    /// Set an attribute on an element.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute from an element.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<Option<String>> {
        Ok(self.element_mut(id)?.remove_attr(name))
    }

    /// Replace every attribute of an element.
    pub fn replace_attributes(&mut self, id: NodeId, attrs: Vec<(String, String)>) -> Result<()> {
        self.element_mut(id)?.replace_attrs(attrs);
        Ok(())
    }

    /// Parent handle, `None` for the root and for detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Child handles in order. Empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// The node followed by its ancestors, innermost first.
    pub fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), move |&n| self.parent(n))
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.ancestors_inclusive(id).last() == Some(self.root())
    }

    /// Nearest inclusive ancestor element carrying `attr`.
    pub fn closest_with_attr(&self, id: NodeId, attr: &str) -> Option<NodeId> {
        self.ancestors_inclusive(id).find(|&n| self.has_attr(n, attr))
    }

    /// Descendants of `id` in preorder, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// First attached element whose `id` attribute equals `id`, in tree order.
    ///
    /// Walks the tree on every call; nothing is indexed because the tree is
    /// mutated from outside the runtime.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.element(n).and_then(Element::id) == Some(id))
    }

    /// First attached element with the given tag name, in tree order.
    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.tag_name(n) == Some(tag))
    }

    /// The `<body>` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        self.first_by_tag("body")
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(NodeKind::Comment(_)) | None => String::new(),
            Some(NodeKind::Document | NodeKind::Element(_)) => self
                .descendants(id)
                .into_iter()
                .filter_map(|n| match self.kind(n) {
                    Some(NodeKind::Text(t)) => Some(t.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Append `child` as the last child of `parent`, detaching it from its
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        match self.kind(parent) {
            None => return Err(DomError::UnknownNode(parent)),
            Some(NodeKind::Text(_) | NodeKind::Comment(_)) => {
                return Err(DomError::NotAContainer(parent));
            }
            Some(_) => {}
        }
        match self.kind(child) {
            None => return Err(DomError::UnknownNode(child)),
            Some(NodeKind::Document) => return Err(DomError::DocumentRoot),
            Some(_) => {}
        }
        if self.ancestors_inclusive(parent).any(|n| n == child) {
            return Err(DomError::Cycle { child, parent });
        }
        self.detach(child)?;
        self.link(parent, child);
        Ok(())
    }

    /// Remove the node from its parent. A detached node is left as is.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id).ok_or(DomError::UnknownNode(id))?.parent;
        if let Some(parent) = parent {
            if let Some(node) = self.node_mut(parent) {
                node.children.retain(|&c| c != id);
            }
            if let Some(node) = self.node_mut(id) {
                node.parent = None;
            }
        }
        Ok(())
    }

    /// Detach every child of `id` and return them in order.
    pub fn take_children(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.node_mut(id).ok_or(DomError::UnknownNode(id))?;
        let children = std::mem::take(&mut node.children);
        for &child in &children {
            if let Some(node) = self.node_mut(child) {
                node.parent = None;
            }
        }
        Ok(children)
    }

    /// Detach the node and free it together with its descendants.
    ///
    /// Every handle into the subtree goes stale. Returns the number of
    /// nodes freed.
    pub fn remove(&mut self, id: NodeId) -> Result<usize> {
        match self.kind(id) {
            None => return Err(DomError::UnknownNode(id)),
            Some(NodeKind::Document) => return Err(DomError::DocumentRoot),
            Some(_) => {}
        }
        self.detach(id)?;
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for n in &doomed {
            let slot = &mut self.slots[n.index];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(n.index);
        }
        trace!(node = %id, freed = doomed.len(), "subtree freed");
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let div = doc.create_element_with_attrs("div", &[("id", "outer")]);
        let span = doc.create_element_with_attrs("span", &[("id", "inner"), ("class", "x")]);
        doc.append_child(doc.root(), body).unwrap();
        doc.append_child(body, div).unwrap();
        doc.append_child(div, span).unwrap();
        (doc, body, div, span)
    }

    #[test]
    fn new_document_has_only_root() {
        let doc = Document::new();
        assert_eq!(doc.kind(doc.root()), Some(&NodeKind::Document));
        assert!(doc.children(doc.root()).is_empty());
        assert!(doc.is_attached(doc.root()));
    }

    #[test]
    fn tag_names_are_lowercased() {
        let mut doc = Document::new();
        let el = doc.create_element("DIV");
        assert_eq!(doc.tag_name(el), Some("div"));
    }

    #[test]
    fn created_nodes_start_detached() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        assert!(!doc.is_attached(el));
        assert_eq!(doc.parent(el), None);
    }

    #[test]
    fn append_attaches_subtree() {
        let (doc, body, div, span) = sample();
        assert!(doc.is_attached(span));
        assert_eq!(doc.parent(span), Some(div));
        assert_eq!(doc.children(body), &[div]);
    }

    #[test]
    fn append_moves_from_previous_parent() {
        let (mut doc, body, div, span) = sample();
        doc.append_child(body, span).unwrap();
        assert!(doc.children(div).is_empty());
        assert_eq!(doc.children(body), &[div, span]);
    }

    #[test]
    fn append_rejects_cycles() {
        let (mut doc, _, div, span) = sample();
        assert_matches!(doc.append_child(span, div), Err(DomError::Cycle { .. }));
        assert_matches!(doc.append_child(div, div), Err(DomError::Cycle { .. }));
    }

    #[test]
    fn append_rejects_text_parent() {
        let (mut doc, body, _, _) = sample();
        let text = doc.create_text("hi");
        doc.append_child(body, text).unwrap();
        let other = doc.create_element("b");
        assert_matches!(doc.append_child(text, other), Err(DomError::NotAContainer(_)));
    }

    #[test]
    fn root_cannot_be_moved() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        assert_matches!(doc.append_child(el, doc.root()), Err(DomError::DocumentRoot));
    }

    #[test]
    fn detach_keeps_handle_valid() {
        let (mut doc, _, div, span) = sample();
        doc.detach(div).unwrap();
        assert!(!doc.is_attached(div));
        assert!(!doc.is_attached(span));
        assert_eq!(doc.attr(span, "class"), Some("x"));
    }

    #[test]
    fn take_children_detaches_all() {
        let (mut doc, body, div, _) = sample();
        let taken = doc.take_children(body).unwrap();
        assert_eq!(taken, vec![div]);
        assert!(doc.children(body).is_empty());
        assert_eq!(doc.parent(div), None);
    }

    #[test]
    fn get_element_by_id_skips_detached() {
        let (mut doc, _, div, span) = sample();
        assert_eq!(doc.get_element_by_id("inner"), Some(span));
        doc.detach(div).unwrap();
        assert_eq!(doc.get_element_by_id("inner"), None);
        assert_eq!(doc.get_element_by_id(""), None);
    }

    #[test]
    fn get_element_by_id_returns_first_in_tree_order() {
        let (mut doc, body, _, span) = sample();
        let dup = doc.create_element_with_attrs("p", &[("id", "inner")]);
        doc.append_child(body, dup).unwrap();
        assert_eq!(doc.get_element_by_id("inner"), Some(span));
    }

    #[test]
    fn descendants_are_preorder() {
        let (mut doc, body, div, span) = sample();
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();
        assert_eq!(doc.descendants(body), vec![div, span, p]);
    }

    #[test]
    fn closest_with_attr_is_inclusive() {
        let (mut doc, body, div, span) = sample();
        doc.set_attr(div, "sx-ignore", "").unwrap();
        assert_eq!(doc.closest_with_attr(span, "sx-ignore"), Some(div));
        assert_eq!(doc.closest_with_attr(div, "sx-ignore"), Some(div));
        assert_eq!(doc.closest_with_attr(body, "sx-ignore"), None);
    }

    #[test]
    fn attribute_set_replace_remove() {
        let (mut doc, _, div, _) = sample();
        doc.set_attr(div, "class", "a").unwrap();
        doc.set_attr(div, "class", "b").unwrap();
        assert_eq!(doc.attr(div, "class"), Some("b"));
        assert_eq!(doc.element(div).unwrap().attrs().len(), 2);
        assert_eq!(doc.remove_attr(div, "class").unwrap(), Some("b".into()));
        assert!(!doc.has_attr(div, "class"));
    }

    #[test]
    fn attribute_ops_on_text_fail() {
        let mut doc = Document::new();
        let text = doc.create_text("t");
        assert_matches!(doc.set_attr(text, "a", "b"), Err(DomError::NotAnElement(_)));
    }

    #[test]
    fn text_content_concatenates() {
        let (mut doc, _, div, span) = sample();
        let a = doc.create_text("Hello ");
        let b = doc.create_text("world");
        doc.append_child(div, a).unwrap();
        doc.append_child(span, b).unwrap();
        assert_eq!(doc.text_content(div), "worldHello ");
    }

    #[test]
    fn node_id_display() {
        let (_, body, _, _) = sample();
        assert_eq!(body.to_string(), format!("#{}.0", body.index()));
    }

    // ── Freeing ─────────────────────────────────────────────────────────

    #[test]
    fn remove_frees_whole_subtree() {
        let (mut doc, body, div, span) = sample();
        let live = doc.node_count();
        assert_eq!(doc.remove(div).unwrap(), 2);
        assert_eq!(doc.node_count(), live - 2);
        assert!(!doc.contains(div));
        assert!(!doc.contains(span));
        assert!(!doc.is_attached(span));
        assert!(doc.children(body).is_empty());
        assert_eq!(doc.attr(span, "class"), None);
    }

    #[test]
    fn freed_slots_are_reused_under_a_new_generation() {
        let (mut doc, _, div, span) = sample();
        let slots = doc.slot_count();
        let _ = doc.remove(div).unwrap();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        assert_eq!(doc.slot_count(), slots);
        assert!(a != div && a != span && b != div && b != span);
        assert!(a.generation() == 1 && b.generation() == 1);
        assert!(!doc.contains(span));
        assert_eq!(doc.tag_name(a), Some("a"));
    }

    #[test]
    fn stale_handles_are_rejected_by_mutation() {
        let (mut doc, body, div, _) = sample();
        let _ = doc.remove(div).unwrap();
        assert_matches!(doc.remove(div), Err(DomError::UnknownNode(_)));
        assert_matches!(doc.append_child(body, div), Err(DomError::UnknownNode(_)));
        assert_matches!(doc.set_attr(div, "a", "b"), Err(DomError::UnknownNode(_)));
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut doc = Document::new();
        assert_matches!(doc.remove(doc.root()), Err(DomError::DocumentRoot));
    }

    #[test]
    fn repeated_create_and_remove_keeps_arena_bounded() {
        let (mut doc, body, _, _) = sample();
        let slots = doc.slot_count();
        for i in 0..1_000 {
            let p = doc.create_element("p");
            let t = doc.create_text(&i.to_string());
            doc.append_child(p, t).unwrap();
            doc.append_child(body, p).unwrap();
            let _ = doc.remove(p).unwrap();
        }
        assert_eq!(doc.slot_count(), slots + 2);
    }
}
