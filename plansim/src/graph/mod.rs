//! State graph: typed nodes, explicit routes, per-field merges, run limits.
//!
//! Build with [`StateGraph`], compile to [`CompiledStateGraph`], run with `invoke` or
//! `stream`. Each node returns a [`NodeOutput`] holding a partial update and a route; the
//! executor merges the update, asks the route for the [`Next`] node, checks it against the
//! static successor table and continues until END or a [`RunLimits`] cap.

mod compile_error;
mod compiled;
mod execution;
mod logging;
mod node;
mod route;
mod state_graph;
mod visualization;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use execution::{Execution, ExecutionStatus, Limit, RunLimits};
pub use node::{Node, NodeOutput};
pub use route::{Next, NodeKey, Route};
pub use state_graph::StateGraph;
pub use visualization::{generate_dot, generate_text};

/// Name of the virtual end node in logs and visualizations.
pub const END: &str = "__end__";
