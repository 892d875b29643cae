//! Routing primitives: where a graph goes after a node.
//!
//! Each graph declares one route enum whose variants encode *(emitting node, decision)*.
//! A node returns a route value explicitly; [`Route::next`] is the transition table and
//! [`Route::successors`] the static successor table used to validate the graph at compile
//! time and every transition at run time.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Identifier of a node in a graph; usually a fieldless enum.
pub trait NodeKey: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {}

impl<T> NodeKey for T where T: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {}

/// Next step after a node: run another node or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Next<K> {
    Node(K),
    End,
}

impl<K: Display> Display for Next<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Next::Node(k) => write!(f, "{}", k),
            Next::End => f.write_str(super::END),
        }
    }
}

/// Routing decision returned by a node of a graph over state `S`.
pub trait Route<S>: Debug + Clone + Send + Sync + 'static {
    type Node: NodeKey;

    /// The only node allowed to return this route.
    fn source(&self) -> Self::Node;

    /// Transition taken after the node's update has been merged into `state`.
    fn next(&self, state: &S) -> Next<Self::Node>;

    /// Every transition `node` can take.
    fn successors(node: Self::Node) -> &'static [Next<Self::Node>];
}
