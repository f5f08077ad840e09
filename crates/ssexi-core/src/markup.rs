//! Markup parsing and serialization.
//!
//! Parsing goes through `scraper` (html5ever), so malformed markup is
//! recovered the way a browser would recover it rather than rejected. The
//! parsed tree is imported into the arena as detached nodes.

use scraper::{ElementRef, Html};

use crate::dom::{Document, Element, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Document {
    /// Parse a full HTML page. The `<html>` element becomes the root's child.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self::new();
        let html_el = doc.import_element(parsed.root_element());
        let root = doc.root();
        doc.link(root, html_el);
        doc
    }

    /// Parse a markup fragment into detached top-level nodes.
    ///
    /// The fragment is parsed in a `<body>` context. Returned nodes are in
    /// source order and have no parent.
    pub fn parse_fragment(&mut self, markup: &str) -> Vec<NodeId> {
        let parsed = Html::parse_fragment(markup);
        self.import_children(parsed.root_element())
    }

    fn import_element(&mut self, el: ElementRef<'_>) -> NodeId {
        let value = el.value();
        let attrs = value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let id = self.push(NodeKind::Element(Element::new(value.name(), attrs)));
        for child in self.import_children(el) {
            self.link(id, child);
        }
        id
    }

    fn import_children(&mut self, el: ElementRef<'_>) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in el.children() {
            let imported = match child.value() {
                scraper::Node::Element(_) => ElementRef::wrap(child).map(|e| self.import_element(e)),
                scraper::Node::Text(text) => Some(self.push(NodeKind::Text(text.to_string()))),
                scraper::Node::Comment(comment) => {
                    Some(self.push(NodeKind::Comment(comment.to_string())))
                }
                _ => None,
            };
            out.extend(imported);
        }
        out
    }

    /// Serialize the node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    /// Serialize the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let raw = self
            .tag_name(id)
            .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.kind(id) {
            None => {}
            Some(NodeKind::Document) => out.push_str(&self.inner_html(id)),
            Some(NodeKind::Text(text)) if raw_text => out.push_str(text),
            Some(NodeKind::Text(text)) => escape_text(text, out),
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(el.tag_name());
                for (name, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag_name()) {
                    return;
                }
                out.push_str(&self.inner_html(id));
                out.push_str("</");
                out.push_str(el.tag_name());
                out.push('>');
            }
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
