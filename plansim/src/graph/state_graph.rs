//! State graph builder.
//!
//! Register nodes, pick the entry (and optionally the round head), then `compile()`.
//! Edges are not added by hand: they come from the graph's `Route::successors` table, and
//! compile checks that every successor of every registered node is registered too.

use std::collections::HashMap;
use std::sync::Arc;

use crate::channels::GraphState;

use super::{CompilationError, CompiledStateGraph, Next, Node, Route};

/// Mutable graph under construction.
pub struct StateGraph<S: GraphState, R: Route<S>> {
    nodes: HashMap<R::Node, Arc<dyn Node<S, R>>>,
    duplicates: Vec<R::Node>,
    entry: Option<R::Node>,
    round_head: Option<R::Node>,
}

impl<S: GraphState, R: Route<S>> Default for StateGraph<S, R> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            duplicates: Vec::new(),
            entry: None,
            round_head: None,
        }
    }
}

impl<S: GraphState, R: Route<S>> StateGraph<S, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node under `node.id()`. Registering an id twice fails compile.
    pub fn add_node(&mut self, node: Arc<dyn Node<S, R>>) -> &mut Self {
        let id = node.id();
        if self.nodes.insert(id, node).is_some() {
            self.duplicates.push(id);
        }
        self
    }

    /// First node of every run.
    pub fn set_entry(&mut self, id: R::Node) -> &mut Self {
        self.entry = Some(id);
        self
    }

    /// Node whose every execution starts a new round (counted against `RunLimits::max_rounds`).
    /// Defaults to the entry node.
    pub fn set_round_head(&mut self, id: R::Node) -> &mut Self {
        self.round_head = Some(id);
        self
    }

    /// Validates the graph and freezes it.
    pub fn compile(self) -> Result<CompiledStateGraph<S, R>, CompilationError> {
        if let Some(dup) = self.duplicates.first() {
            return Err(CompilationError::DuplicateNode(dup.to_string()));
        }
        let entry = self.entry.ok_or(CompilationError::MissingEntry)?;
        if !self.nodes.contains_key(&entry) {
            return Err(CompilationError::NodeNotFound(entry.to_string()));
        }
        let round_head = self.round_head.unwrap_or(entry);
        if !self.nodes.contains_key(&round_head) {
            return Err(CompilationError::NodeNotFound(round_head.to_string()));
        }
        for from in self.nodes.keys() {
            for next in R::successors(*from) {
                if let Next::Node(to) = next {
                    if !self.nodes.contains_key(to) {
                        return Err(CompilationError::UnknownSuccessor {
                            from: from.to_string(),
                            to: to.to_string(),
                        });
                    }
                }
            }
        }
        Ok(CompiledStateGraph {
            nodes: self.nodes,
            entry,
            round_head,
        })
    }
}
