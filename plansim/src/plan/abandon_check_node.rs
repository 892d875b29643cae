//! AbandonCheck node: after a failed step, decide whether to give up.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{invoke_structured, CallParams, LlmGateway};

use super::config::PlanConfig;
use super::prompt;
use super::route::{PlanNode, PlanRoute};
use super::schema::{AbandonChoice, AbandonVerdict};
use super::state::{FinalOutcome, Plan, PlanUpdate, RoundResult, Terminal};

pub struct AbandonCheckNode {
    gateway: Arc<dyn LlmGateway>,
    config: Arc<PlanConfig>,
}

impl AbandonCheckNode {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: Arc<PlanConfig>) -> Self {
        Self { gateway, config }
    }
}

#[async_trait]
impl Node<Plan, PlanRoute> for AbandonCheckNode {
    fn id(&self) -> PlanNode {
        PlanNode::AbandonCheck
    }

    async fn run(&self, state: &Plan) -> Result<NodeOutput<Plan, PlanRoute>, AgentError> {
        let verdict: AbandonVerdict = invoke_structured(
            self.gateway.as_ref(),
            prompt::abandon_check(state),
            CallParams::new(&self.config.thinking_model),
        )
        .await?;
        let mut update = PlanUpdate {
            round_result_history: Some(vec![RoundResult::from(verdict.abandon)]),
            ..Default::default()
        };
        if verdict.abandon == AbandonChoice::Abandon {
            tracing::info!(
                plan_id = %state.plan_id,
                round = state.current_round_index(),
                budget = state.resource_budget,
                time = state.resource_time,
                "plan abandoned"
            );
            update.final_outcome = Some(Some(FinalOutcome {
                verdict: Terminal::Abandoned,
                round: state.current_round_index(),
                last_outcome: state.last_outcome().cloned(),
            }));
        }
        Ok(NodeOutput::new(update, PlanRoute::AbandonChecked(verdict.abandon)))
    }
}
