//! Error types for graph, document and session operations.

use crate::nodes::NodeId;
use thiserror::Error;

/// A structural rule rejected an edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("cannot move '{0}': node cannot be a child")]
    CannotBeChild(NodeId),
    #[error("cannot move to '{0}': node cannot be a parent")]
    CannotBeParent(NodeId),
    #[error("cannot move to '{parent}': parent at max capacity ({count}/{max} children)")]
    DegreeExceeded {
        parent: NodeId,
        count: usize,
        max: usize,
    },
    #[error("cannot link '{parent}' -> '{child}': link not allowed by policy")]
    LinkNotAllowed { parent: NodeId, child: NodeId },
    #[error("cannot place '{0}' at the root: only scenes may be roots")]
    NotAllowedAtRoot(NodeId),
    #[error("cannot move '{node}' into its own descendant '{target}'")]
    Cycle { node: NodeId, target: NodeId },
}

/// Errors raised by [`crate::graph::NodeGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),
    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised while importing or exporting a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid snapshot: {0}")]
    Graph(#[from] GraphError),
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Errors raised by [`crate::session::EditorSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("No scene available to receive pasted nodes")]
    NoScene,
    #[error("'{0}' is not a scene")]
    NotAScene(NodeId),
    #[error("Clipboard is empty")]
    EmptyClipboard,
}

/// Errors raised while loading [`crate::config::KernelConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
