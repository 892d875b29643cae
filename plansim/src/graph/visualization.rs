//! Graph visualization: Graphviz DOT and plain text, derived from the successor table.

use std::fmt::Write;

use crate::channels::GraphState;

use super::{CompiledStateGraph, Next, Route, END};

/// Registered node ids sorted by name, so output is stable.
fn sorted_nodes<S: GraphState, R: Route<S>>(graph: &CompiledStateGraph<S, R>) -> Vec<R::Node> {
    let mut ids: Vec<_> = graph.node_ids().collect();
    ids.sort_by_key(|id| id.to_string());
    ids
}

/// Graphviz DOT representation: one box per node, one edge per successor-table entry.
pub fn generate_dot<S: GraphState, R: Route<S>>(graph: &CompiledStateGraph<S, R>) -> String {
    let mut dot = String::from("digraph {\n  rankdir=LR;\n  node [shape=box];\n\n");
    let _ = writeln!(dot, "  \"{}\" [label=\"END\", style=bold];", END);
    for id in sorted_nodes(graph) {
        if id == graph.entry() {
            let _ = writeln!(dot, "  \"{}\" [style=bold];", id);
        } else {
            let _ = writeln!(dot, "  \"{}\";", id);
        }
    }
    dot.push('\n');
    for id in sorted_nodes(graph) {
        for next in R::successors(id) {
            let _ = writeln!(dot, "  \"{}\" -> \"{}\";", id, next);
        }
    }
    dot.push_str("}\n");
    dot
}

/// Text listing of nodes and their possible successors.
pub fn generate_text<S: GraphState, R: Route<S>>(graph: &CompiledStateGraph<S, R>) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Graph Structure:");
    let _ = writeln!(text, "Nodes: {}", graph.node_ids().count());
    let _ = writeln!(text, "Entry: {}", graph.entry());
    let _ = writeln!(text, "Round head: {}", graph.round_head());
    let _ = writeln!(text, "\nTransitions:");
    for id in sorted_nodes(graph) {
        let targets: Vec<String> = R::successors(id)
            .iter()
            .map(|n: &Next<R::Node>| n.to_string())
            .collect();
        let _ = writeln!(text, "  {} -> {}", id, targets.join(" | "));
    }
    text
}
