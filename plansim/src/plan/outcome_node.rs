//! Outcome node, instantiated once per branch.
//!
//! Records what the round's step revealed and what it cost. The aggregate assumptions are
//! replaced by their concatenation with the outcome's findings; budget and time are reduced
//! by the increments on both branches.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{invoke_structured, CallParams, LlmGateway};

use super::config::PlanConfig;
use super::prompt;
use super::route::{PlanNode, PlanRoute};
use super::state::{Outcome, Plan, PlanUpdate};

/// Which branch an [`OutcomeNode`] serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Success,
    Failure,
}

pub struct OutcomeNode {
    branch: Branch,
    gateway: Arc<dyn LlmGateway>,
    config: Arc<PlanConfig>,
}

impl OutcomeNode {
    pub fn new(branch: Branch, gateway: Arc<dyn LlmGateway>, config: Arc<PlanConfig>) -> Self {
        Self {
            branch,
            gateway,
            config,
        }
    }

    pub fn success(gateway: Arc<dyn LlmGateway>, config: Arc<PlanConfig>) -> Self {
        Self::new(Branch::Success, gateway, config)
    }

    pub fn failure(gateway: Arc<dyn LlmGateway>, config: Arc<PlanConfig>) -> Self {
        Self::new(Branch::Failure, gateway, config)
    }
}

/// Update that records `outcome` against `state`.
pub(crate) fn outcome_update(state: &Plan, outcome: Outcome) -> PlanUpdate {
    let outcome = outcome.normalized();
    PlanUpdate {
        cumulative_assumptions: Some(state.cumulative_assumptions.merged_with(&outcome)),
        resource_budget: Some(state.resource_budget - outcome.cost_increment),
        resource_time: Some(state.resource_time - outcome.time_increment),
        outcome_history: Some(vec![outcome]),
        ..Default::default()
    }
}

#[async_trait]
impl Node<Plan, PlanRoute> for OutcomeNode {
    fn id(&self) -> PlanNode {
        match self.branch {
            Branch::Success => PlanNode::GoodOutcome,
            Branch::Failure => PlanNode::BadOutcome,
        }
    }

    async fn run(&self, state: &Plan) -> Result<NodeOutput<Plan, PlanRoute>, AgentError> {
        let step = state.last_step()?;
        let (prompt, route) = match self.branch {
            Branch::Success => (
                prompt::success_outcome(state, step, &self.config),
                PlanRoute::SuccessRecorded,
            ),
            Branch::Failure => (
                prompt::failure_outcome(state, step, &self.config),
                PlanRoute::FailureRecorded,
            ),
        };
        let outcome: Outcome = invoke_structured(
            self.gateway.as_ref(),
            prompt,
            CallParams::new(&self.config.thinking_model),
        )
        .await?;
        let update = outcome_update(state, outcome);
        tracing::debug!(
            branch = ?self.branch,
            budget = ?update.resource_budget,
            time = ?update.resource_time,
            "outcome recorded"
        );
        Ok(NodeOutput::new(update, route))
    }
}
