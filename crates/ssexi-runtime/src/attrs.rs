//! Binding attribute names.

/// Default attribute prefix.
pub const DEFAULT_PREFIX: &str = "sx-";

/// Fully qualified names of the attributes the runtime reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNames {
    /// Push endpoint of a live region (`sx-connect`).
    pub connect: String,
    /// Submission endpoint of an asynchronous form (`sx-post`).
    pub post: String,
    /// Excludes the element and its subtree from binding (`sx-ignore`).
    pub ignore: String,
    /// Post-success policy of a form (`sx-swap`).
    pub swap: String,
}

impl AttributeNames {
    /// Build the attribute set for a prefix such as `"sx-"` or `"data-sx-"`.
    pub fn new(prefix: &str) -> Self {
        Self {
            connect: format!("{prefix}connect"),
            post: format!("{prefix}post"),
            ignore: format!("{prefix}ignore"),
            swap: format!("{prefix}swap"),
        }
    }
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
