//! Compiled state graph: immutable, runs with `invoke` or `stream`.
//!
//! One control thread per run: nodes execute strictly one after another, each gateway or
//! store call inside a node being an await point. Independent runs share nothing mutable
//! and may be spawned concurrently on the same compiled graph.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::channels::{GraphState, StateUpdate};
use crate::error::AgentError;
use crate::stream::GraphEvent;

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_limit_exceeded, log_node_complete,
    log_node_start, log_node_state, log_state_update,
};
use super::{Execution, ExecutionStatus, Limit, Next, Node, Route, RunLimits};

/// Compiled graph. Built by `StateGraph::compile`.
pub struct CompiledStateGraph<S: GraphState, R: Route<S>> {
    pub(super) nodes: HashMap<R::Node, Arc<dyn Node<S, R>>>,
    pub(super) entry: R::Node,
    pub(super) round_head: R::Node,
}

impl<S: GraphState, R: Route<S>> Clone for CompiledStateGraph<S, R> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            entry: self.entry,
            round_head: self.round_head,
        }
    }
}

type EventSender<S, R> = mpsc::Sender<GraphEvent<S, R>>;

async fn emit<S, R: Route<S>>(tx: Option<&EventSender<S, R>>, event: GraphEvent<S, R>) {
    if let Some(tx) = tx {
        let _ = tx.send(event).await;
    }
}

impl<S: GraphState, R: Route<S>> CompiledStateGraph<S, R> {
    pub fn entry(&self) -> R::Node {
        self.entry
    }

    pub fn round_head(&self) -> R::Node {
        self.round_head
    }

    /// Registered node ids in no particular order.
    pub fn node_ids(&self) -> impl Iterator<Item = R::Node> + '_ {
        self.nodes.keys().copied()
    }

    /// Runs from the entry node until END, a limit, or a failure.
    ///
    /// Never returns bare errors: the `Execution` carries the last merged state next to the
    /// status so callers can always report what happened.
    pub async fn invoke(&self, state: S, limits: RunLimits) -> Execution<S, R> {
        self.run_loop(state, limits, None).await
    }

    /// Same as `invoke`, emitting [`GraphEvent`]s on a channel-backed stream. The last event
    /// is always `Finished`.
    pub fn stream(&self, state: S, limits: RunLimits) -> ReceiverStream<GraphEvent<S, R>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        tokio::spawn(async move {
            let execution = graph.run_loop(state, limits, Some(&tx)).await;
            let _ = tx.send(GraphEvent::Finished(Box::new(execution))).await;
        });
        ReceiverStream::new(rx)
    }

    async fn run_loop(
        &self,
        mut state: S,
        limits: RunLimits,
        tx: Option<&EventSender<S, R>>,
    ) -> Execution<S, R> {
        log_graph_start(self.entry);

        let mut current = self.entry;
        let mut steps = 0usize;
        let mut rounds = 0usize;
        let mut path = Vec::new();
        let mut last_route: Option<R> = None;

        let status = loop {
            if current == self.round_head {
                if limits.max_rounds.is_some_and(|max| rounds >= max) {
                    break ExecutionStatus::LimitExceeded(Limit::Rounds(rounds));
                }
                rounds += 1;
            }
            if let Some(max) = limits.max_steps.filter(|max| steps >= *max) {
                break ExecutionStatus::LimitExceeded(Limit::Steps(max));
            }
            let Some(node) = self.nodes.get(&current).cloned() else {
                break ExecutionStatus::Failed(AgentError::ContractViolation(format!(
                    "node {} is not registered",
                    current
                )));
            };

            steps += 1;
            path.push(current);
            log_node_start(current, steps);
            log_node_state(current, &state);
            emit(
                tx,
                GraphEvent::NodeStart {
                    node: current,
                    step: steps,
                },
            )
            .await;

            let output = match node.run(&state).await {
                Ok(output) => output,
                Err(e) => {
                    log_graph_error(current, &e);
                    emit(
                        tx,
                        GraphEvent::NodeFailed {
                            node: current,
                            error: e.to_string(),
                        },
                    )
                    .await;
                    break ExecutionStatus::Failed(e);
                }
            };

            if output.route.source() != current {
                let e = AgentError::ContractViolation(format!(
                    "node {} returned route {:?} owned by node {}",
                    current,
                    output.route,
                    output.route.source()
                ));
                log_graph_error(current, &e);
                break ExecutionStatus::Failed(e);
            }

            let report = output.update.apply_to(&mut state);
            log_state_update(current, &report);

            let next = output.route.next(&state);
            if !R::successors(current).contains(&next) {
                let e = AgentError::ContractViolation(format!(
                    "transition {} -> {} is not in the successor table",
                    current, next
                ));
                log_graph_error(current, &e);
                break ExecutionStatus::Failed(e);
            }
            log_node_complete(current, &output.route, &next);

            if tx.is_some() {
                emit(
                    tx,
                    GraphEvent::NodeEnd {
                        node: current,
                        route: output.route.clone(),
                        applied: report.applied,
                    },
                )
                .await;
                emit(tx, GraphEvent::Values(state.clone())).await;
            }
            last_route = Some(output.route);

            match next {
                Next::End => break ExecutionStatus::Completed,
                Next::Node(id) => current = id,
            }
        };

        match &status {
            ExecutionStatus::Completed => log_graph_complete(steps, rounds),
            ExecutionStatus::LimitExceeded(limit) => log_limit_exceeded(limit, steps, rounds),
            ExecutionStatus::Failed(_) => {}
        }

        Execution {
            state,
            status,
            steps,
            rounds,
            path,
            last_route,
        }
    }
}
