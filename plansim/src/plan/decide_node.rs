//! Decide node: judge whether the round's step succeeds.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutput};
use crate::llm::{invoke_structured, CallParams, LlmGateway};

use super::config::PlanConfig;
use super::prompt;
use super::route::{PlanNode, PlanRoute};
use super::schema::Decider;
use super::state::{Plan, PlanUpdate, RoundResult};

pub struct DecideNode {
    gateway: Arc<dyn LlmGateway>,
    config: Arc<PlanConfig>,
}

impl DecideNode {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: Arc<PlanConfig>) -> Self {
        Self { gateway, config }
    }
}

#[async_trait]
impl Node<Plan, PlanRoute> for DecideNode {
    fn id(&self) -> PlanNode {
        PlanNode::Decide
    }

    async fn run(&self, state: &Plan) -> Result<NodeOutput<Plan, PlanRoute>, AgentError> {
        let step = state.last_step()?;
        let verdict: Decider = invoke_structured(
            self.gateway.as_ref(),
            prompt::decide(state, step, &self.config),
            CallParams::new(&self.config.thinking_model),
        )
        .await?;
        tracing::debug!(decision = ?verdict.decision, reason = %verdict.reason, "step judged");
        let update = PlanUpdate {
            round_result_history: Some(vec![RoundResult::from(verdict.decision)]),
            ..Default::default()
        };
        Ok(NodeOutput::new(update, PlanRoute::Decided(verdict.decision)))
    }
}
