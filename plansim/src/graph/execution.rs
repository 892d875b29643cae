//! Run limits and the result of one graph run.

use crate::error::AgentError;

use super::Route;

/// Hard caps for one run. `None` means unbounded.
///
/// A *step* is one node execution. A *round* is one entry into the graph's round head
/// (the entry node unless `StateGraph::set_round_head` says otherwise).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    pub max_steps: Option<usize>,
    pub max_rounds: Option<usize>,
}

impl RunLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }
}

/// Which cap stopped the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Steps(usize),
    Rounds(usize),
}

/// How a run ended.
#[derive(Debug)]
pub enum ExecutionStatus {
    /// A node routed to END.
    Completed,
    /// A cap in `RunLimits` was hit before END.
    LimitExceeded(Limit),
    /// A node failed or broke the routing contract.
    Failed(AgentError),
}

/// Outcome of a run. Always carries the last merged state, whatever the status.
#[derive(Debug)]
pub struct Execution<S, R: Route<S>> {
    pub state: S,
    pub status: ExecutionStatus,
    /// Node executions performed.
    pub steps: usize,
    /// Rounds started and allowed to run.
    pub rounds: usize,
    /// Nodes executed, in order.
    pub path: Vec<R::Node>,
    /// Route returned by the last node that completed.
    pub last_route: Option<R>,
}

impl<S, R: Route<S>> Execution<S, R> {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, ExecutionStatus::Completed)
    }

    /// Number of times `node` ran.
    pub fn visits(&self, node: R::Node) -> usize {
        self.path.iter().filter(|n| **n == node).count()
    }

    /// Final state on completion; limit and failure statuses become errors.
    pub fn into_result(self) -> Result<S, AgentError> {
        match self.status {
            ExecutionStatus::Completed => Ok(self.state),
            ExecutionStatus::LimitExceeded(limit) => Err(AgentError::ExecutionFailed(format!(
                "run limit exceeded: {:?}",
                limit
            ))),
            ExecutionStatus::Failed(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_limits_builders() {
        let limits = RunLimits::unbounded().with_max_steps(100).with_max_rounds(10);
        assert_eq!(limits.max_steps, Some(100));
        assert_eq!(limits.max_rounds, Some(10));
        assert_eq!(RunLimits::default(), RunLimits::unbounded());
    }
}
