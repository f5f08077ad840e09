//! Document error types.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised by structural document operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The handle does not belong to this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The operation requires an element node.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// The node cannot hold children (text and comment nodes).
    #[error("node {0} cannot have children")]
    NotAContainer(NodeId),

    /// The document root cannot be moved under another node.
    #[error("the document root cannot be re-parented")]
    DocumentRoot,

    /// Inserting the child would make a node its own ancestor.
    #[error("cannot insert {child} under its own descendant {parent}")]
    Cycle {
        /// Node that would have been moved.
        child: NodeId,
        /// Intended new parent.
        parent: NodeId,
    },
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DomError>;
