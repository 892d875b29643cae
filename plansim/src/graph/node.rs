//! Graph node trait: one step in a StateGraph.
//!
//! Reads the current state, returns a partial update plus an explicit route. The executor
//! merges the update with the state schema's per-field policies, then follows the route.

use async_trait::async_trait;

use crate::channels::GraphState;
use crate::error::AgentError;

use super::Route;

/// What a node hands back to the executor.
#[derive(Debug)]
pub struct NodeOutput<S: GraphState, R> {
    pub update: S::Update,
    pub route: R,
}

impl<S: GraphState, R> NodeOutput<S, R> {
    pub fn new(update: S::Update, route: R) -> Self {
        Self { update, route }
    }
}

/// One step in a graph: state in, (partial update, route) out.
///
/// **Interaction**: Registered with `StateGraph::add_node`; run by
/// `CompiledStateGraph::invoke` and `stream`.
#[async_trait]
pub trait Node<S, R>: Send + Sync
where
    S: GraphState,
    R: Route<S>,
{
    /// Node id; unique within a graph.
    fn id(&self) -> R::Node;

    /// One step. Errors abort the run; recoverable failures are handled inside the node.
    async fn run(&self, state: &S) -> Result<NodeOutput<S, R>, AgentError>;
}
