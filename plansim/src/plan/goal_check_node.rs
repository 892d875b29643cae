//! GoalCheck node: after a successful step, decide whether the goal is reached.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{invoke_structured, CallParams, LlmGateway};

use super::config::PlanConfig;
use super::prompt;
use super::route::{PlanNode, PlanRoute};
use super::schema::{Achieved, GoalVerdict};
use super::state::{FinalOutcome, Plan, PlanUpdate, RoundResult, Terminal};

pub struct GoalCheckNode {
    gateway: Arc<dyn LlmGateway>,
    config: Arc<PlanConfig>,
}

impl GoalCheckNode {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: Arc<PlanConfig>) -> Self {
        Self { gateway, config }
    }
}

#[async_trait]
impl Node<Plan, PlanRoute> for GoalCheckNode {
    fn id(&self) -> PlanNode {
        PlanNode::GoalCheck
    }

    async fn run(&self, state: &Plan) -> Result<NodeOutput<Plan, PlanRoute>, AgentError> {
        let verdict: GoalVerdict = invoke_structured(
            self.gateway.as_ref(),
            prompt::goal_check(state),
            CallParams::new(&self.config.thinking_model),
        )
        .await?;
        let mut update = PlanUpdate {
            round_result_history: Some(vec![RoundResult::from(verdict.achieved)]),
            ..Default::default()
        };
        if verdict.achieved == Achieved::Yes {
            tracing::info!(plan_id = %state.plan_id, round = state.current_round_index(), "goal achieved");
            update.final_outcome = Some(Some(FinalOutcome {
                verdict: Terminal::GoalAchieved,
                round: state.current_round_index(),
                last_outcome: state.last_outcome().cloned(),
            }));
        }
        Ok(NodeOutput::new(update, PlanRoute::GoalChecked(verdict.achieved)))
    }
}
