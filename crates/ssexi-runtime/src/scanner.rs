//! Attribute scanner.
//!
//! Walks a subtree and reports the elements that carry a non-empty
//! connect or post attribute. Elements carrying the ignore attribute are
//! pruned together with their descendants, and a root that sits under an
//! ignored ancestor yields nothing. The tree is re-walked on every call.

use ssexi_core::{Document, NodeId};

use crate::attrs::AttributeNames;

/// Elements found by [`scan`], each list in tree order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Elements with a connect endpoint.
    pub connect: Vec<NodeId>,
    /// Elements with a post endpoint.
    pub post: Vec<NodeId>,
}

impl ScanResult {
    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.connect.is_empty() && self.post.is_empty()
    }
}

/// Whether the node or one of its ancestors carries the ignore attribute.
pub fn is_ignored(doc: &Document, node: NodeId, names: &AttributeNames) -> bool {
    doc.closest_with_attr(node, &names.ignore).is_some()
}

/// Scan `root` (inclusive) for bindable elements.
pub fn scan(doc: &Document, root: NodeId, names: &AttributeNames) -> ScanResult {
    let mut result = ScanResult::default();
    if !doc.contains(root) || is_ignored(doc, root, names) {
        return result;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if doc.has_attr(node, &names.ignore) {
            continue;
        }
        if doc.attr(node, &names.connect).is_some_and(|v| !v.is_empty()) {
            result.connect.push(node);
        }
        if doc.attr(node, &names.post).is_some_and(|v| !v.is_empty()) {
            result.post.push(node);
        }
        stack.extend(doc.children(node).iter().rev());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> AttributeNames {
        AttributeNames::default()
    }

    #[test]
    fn finds_root_and_descendants_in_order() {
        let doc = Document::parse(
            r#"<body sx-connect="/a">
                 <div sx-connect="/b"><form sx-post="/f"></form></div>
                 <p sx-connect="/c"></p>
               </body>"#,
        );
        let body = doc.body().unwrap();
        let found = scan(&doc, body, &names());
        let endpoints: Vec<&str> = found
            .connect
            .iter()
            .map(|&n| doc.attr(n, "sx-connect").unwrap())
            .collect();
        assert_eq!(endpoints, ["/a", "/b", "/c"]);
        assert_eq!(found.post.len(), 1);
        assert_eq!(doc.tag_name(found.post[0]), Some("form"));
    }

    #[test]
    fn ignored_subtree_is_pruned() {
        let doc = Document::parse(
            r#"<body>
                 <div sx-ignore><p sx-connect="/hidden"></p></div>
                 <p sx-connect="/shown"></p>
               </body>"#,
        );
        let found = scan(&doc, doc.body().unwrap(), &names());
        assert_eq!(found.connect.len(), 1);
        assert_eq!(doc.attr(found.connect[0], "sx-connect"), Some("/shown"));
    }

    #[test]
    fn root_under_ignored_ancestor_yields_nothing() {
        let doc = Document::parse(r#"<body><div sx-ignore><p sx-connect="/x"></p></div></body>"#);
        let p = doc.first_by_tag("p").unwrap();
        let found = scan(&doc, p, &names());
        assert!(found.is_empty());
    }

    #[test]
    fn empty_trigger_is_skipped() {
        let doc = Document::parse(r#"<body><div sx-connect=""></div><form sx-post></form></body>"#);
        assert!(scan(&doc, doc.root(), &names()).is_empty());
    }

    #[test]
    fn custom_prefix() {
        let doc = Document::parse(r#"<body><div data-sx-connect="/a"></div><div sx-connect="/b"></div></body>"#);
        let found = scan(&doc, doc.root(), &AttributeNames::new("data-sx-"));
        assert_eq!(found.connect.len(), 1);
    }
}
