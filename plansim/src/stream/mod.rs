//! Events emitted by `CompiledStateGraph::stream`.
//!
//! Consumers (persistence, progress display) receive one `NodeStart`/`NodeEnd` pair per step,
//! a `Values` snapshot after each merge, and a final `Finished` carrying the whole execution.

use crate::graph::{Execution, Route};

#[derive(Debug)]
pub enum GraphEvent<S, R: Route<S>> {
    NodeStart {
        node: R::Node,
        step: usize,
    },
    /// Node succeeded; `applied` lists the merged fields.
    NodeEnd {
        node: R::Node,
        route: R,
        applied: Vec<&'static str>,
    },
    NodeFailed {
        node: R::Node,
        error: String,
    },
    /// Full state after a node's update was merged.
    Values(S),
    Finished(Box<Execution<S, R>>),
}

impl<S, R: Route<S>> GraphEvent<S, R> {
    /// Node the event belongs to; `None` for state snapshots and the final event.
    pub fn node(&self) -> Option<R::Node> {
        match self {
            GraphEvent::NodeStart { node, .. }
            | GraphEvent::NodeEnd { node, .. }
            | GraphEvent::NodeFailed { node, .. } => Some(*node),
            GraphEvent::Values(_) | GraphEvent::Finished(_) => None,
        }
    }
}
