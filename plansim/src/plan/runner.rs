//! Plan graph runner: build, initial state, invoke and stream.
//!
//! Graph: generate_idea → decide → {good_outcome → goal_check | bad_outcome → abandon_check}
//! → {summarize → generate_idea | END}. Every entry into generate_idea starts a round and
//! counts against `PlanConfig::max_rounds`.

use std::sync::Arc;

use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::graph::{
    CompilationError, CompiledStateGraph, Execution, ExecutionStatus, Limit, RunLimits,
    StateGraph,
};
use crate::llm::LlmGateway;
use crate::memory::NoveltyStore;
use crate::stream::GraphEvent;

use super::abandon_check_node::AbandonCheckNode;
use super::config::PlanConfig;
use super::decide_node::DecideNode;
use super::generate_idea_node::GenerateIdeaNode;
use super::goal_check_node::GoalCheckNode;
use super::outcome_node::OutcomeNode;
use super::route::{PlanNode, PlanRoute};
use super::state::{InputState, Plan, Terminal};
use super::summarize_node::SummarizeNode;

/// How a plan run ended. Exactly one per run.
#[derive(Debug)]
pub enum PlanTermination {
    GoalAchieved,
    Abandoned,
    /// `limit` rounds ran without reaching END.
    RoundLimitExceeded { limit: usize },
    Failed { error: AgentError },
}

/// Final plan (last merged state, whatever the ending) and how the run ended.
#[derive(Debug)]
pub struct PlanRunResult {
    pub plan: Plan,
    pub termination: PlanTermination,
    /// Nodes executed, in order.
    pub path: Vec<PlanNode>,
}

impl PlanRunResult {
    fn from_execution(execution: Execution<Plan, PlanRoute>) -> Self {
        let termination = match execution.status {
            ExecutionStatus::Completed => match execution.state.final_outcome.as_ref() {
                Some(fo) => match fo.verdict {
                    Terminal::GoalAchieved => PlanTermination::GoalAchieved,
                    Terminal::Abandoned => PlanTermination::Abandoned,
                },
                None => PlanTermination::Failed {
                    error: AgentError::ContractViolation(
                        "plan reached END without a final outcome".into(),
                    ),
                },
            },
            ExecutionStatus::LimitExceeded(Limit::Rounds(limit)) => {
                PlanTermination::RoundLimitExceeded { limit }
            }
            ExecutionStatus::LimitExceeded(Limit::Steps(limit)) => PlanTermination::Failed {
                error: AgentError::ExecutionFailed(format!("step limit {} exceeded", limit)),
            },
            ExecutionStatus::Failed(error) => PlanTermination::Failed { error },
        };
        Self {
            plan: execution.state,
            termination,
            path: execution.path,
        }
    }

    pub fn is_goal_achieved(&self) -> bool {
        matches!(self.termination, PlanTermination::GoalAchieved)
    }
}

/// Registers the seven planning nodes and compiles the graph.
pub fn build_plan_graph(
    gateway: Arc<dyn LlmGateway>,
    novelty: Arc<dyn NoveltyStore>,
    config: Arc<PlanConfig>,
) -> Result<CompiledStateGraph<Plan, PlanRoute>, CompilationError> {
    let mut graph = StateGraph::<Plan, PlanRoute>::new();
    graph
        .add_node(Arc::new(GenerateIdeaNode::new(
            Arc::clone(&gateway),
            novelty,
            Arc::clone(&config),
        )))
        .add_node(Arc::new(DecideNode::new(Arc::clone(&gateway), Arc::clone(&config))))
        .add_node(Arc::new(OutcomeNode::success(Arc::clone(&gateway), Arc::clone(&config))))
        .add_node(Arc::new(OutcomeNode::failure(Arc::clone(&gateway), Arc::clone(&config))))
        .add_node(Arc::new(GoalCheckNode::new(Arc::clone(&gateway), Arc::clone(&config))))
        .add_node(Arc::new(AbandonCheckNode::new(Arc::clone(&gateway), Arc::clone(&config))))
        .add_node(Arc::new(SummarizeNode::new(gateway, config)))
        .set_entry(PlanNode::GenerateIdea)
        .set_round_head(PlanNode::GenerateIdea);
    graph.compile()
}

/// Plan runner: owns the compiled graph and the run configuration.
pub struct PlanRunner {
    compiled: CompiledStateGraph<Plan, PlanRoute>,
    config: Arc<PlanConfig>,
}

impl PlanRunner {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        novelty: Arc<dyn NoveltyStore>,
        config: PlanConfig,
    ) -> Result<Self, CompilationError> {
        let config = Arc::new(config);
        let compiled = build_plan_graph(gateway, novelty, Arc::clone(&config))?;
        Ok(Self { compiled, config })
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn graph(&self) -> &CompiledStateGraph<Plan, PlanRoute> {
        &self.compiled
    }

    /// Fresh plan for `goal`; the id is `run_id` when configured.
    pub fn initial_plan(&self, goal: InputState, budget: f64, time: f64) -> Plan {
        match &self.config.run_id {
            Some(id) => Plan::with_id(id.clone(), goal, budget, time),
            None => Plan::new(goal, budget, time),
        }
    }

    fn limits(&self) -> RunLimits {
        RunLimits::unbounded().with_max_rounds(self.config.max_rounds)
    }

    /// Runs one plan to END, the round limit, or a failure.
    pub async fn run(&self, goal: InputState, budget: f64, time: f64) -> PlanRunResult {
        let plan = self.initial_plan(goal, budget, time);
        tracing::info!(
            plan_id = %plan.plan_id,
            goal = %plan.goal_state.goal,
            topic = %self.config.topic_label(),
            budget,
            time,
            "plan run start"
        );
        let execution = self.compiled.invoke(plan, self.limits()).await;
        let result = PlanRunResult::from_execution(execution);
        match &result.termination {
            PlanTermination::Failed { error } => {
                tracing::error!(plan_id = %result.plan.plan_id, error = %error, "plan run failed")
            }
            other => tracing::info!(
                plan_id = %result.plan.plan_id,
                termination = ?other,
                rounds = result.plan.step_history.len(),
                "plan run finished"
            ),
        }
        result
    }

    /// Same as `run`, as a stream of graph events ending with `Finished`.
    pub fn stream(
        &self,
        goal: InputState,
        budget: f64,
        time: f64,
    ) -> ReceiverStream<GraphEvent<Plan, PlanRoute>> {
        let plan = self.initial_plan(goal, budget, time);
        self.compiled.stream(plan, self.limits())
    }
}

/// Converts the `Finished` event payload of [`PlanRunner::stream`] into a result.
impl From<Execution<Plan, PlanRoute>> for PlanRunResult {
    fn from(execution: Execution<Plan, PlanRoute>) -> Self {
        Self::from_execution(execution)
    }
}
