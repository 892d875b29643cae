//! Structured logging for graph execution: run lifecycle, node execution, state merges.

use std::fmt::{Debug, Display};

use crate::channels::MergeReport;
use crate::error::AgentError;

use super::{Limit, Next};

pub fn log_node_start(node: impl Display, step: usize) {
    tracing::debug!(node = %node, step, "Starting node execution");
}

/// Logs the input state of a node at trace level; states grow with every round.
pub fn log_node_state<S: Debug>(node: impl Display, state: &S) {
    tracing::trace!(node = %node, state = ?state, "Node execution: state");
}

pub fn log_node_complete<R: Debug, K: Display>(node: impl Display, route: &R, next: &Next<K>) {
    tracing::debug!(node = %node, ?route, next = %next, "Node execution complete");
}

/// Logs merged fields; fields rejected by a set-once policy are a warning.
pub fn log_state_update(node: impl Display, report: &MergeReport) {
    tracing::debug!(node = %node, applied = ?report.applied, "State updated");
    if !report.rejected.is_empty() {
        tracing::warn!(
            node = %node,
            rejected = ?report.rejected,
            "Ignored writes to fields that were already set"
        );
    }
}

pub fn log_graph_start(entry: impl Display) {
    tracing::info!(entry = %entry, "Starting graph execution");
}

pub fn log_graph_complete(steps: usize, rounds: usize) {
    tracing::info!(steps, rounds, "Graph execution complete");
}

pub fn log_limit_exceeded(limit: &Limit, steps: usize, rounds: usize) {
    tracing::warn!(?limit, steps, rounds, "Graph execution stopped at run limit");
}

pub fn log_graph_error(node: impl Display, error: &AgentError) {
    tracing::error!(node = %node, %error, "Graph execution error");
}
