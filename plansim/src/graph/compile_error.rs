//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when the entry is missing or the static successor
//! table references a node that was never registered.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id was referenced (entry, round head) but not registered via `add_node`.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// `set_entry` was never called.
    #[error("graph has no entry node")]
    MissingEntry,

    /// Two nodes were registered under the same id.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// A registered node can route to a node that is not registered.
    #[error("node {from} routes to unregistered node {to}")]
    UnknownSuccessor { from: String, to: String },
}
