//! Conversation graph runner: build, invoke and stream.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_stream::wrappers::ReceiverStream;

use crate::graph::{CompilationError, CompiledStateGraph, ExecutionStatus, RunLimits, StateGraph};
use crate::llm::LlmGateway;
use crate::memory::Embedder;
use crate::message::Message;
use crate::stream::GraphEvent;
use crate::tool_source::ToolSource;

use super::buyer_node::BuyerNode;
use super::config::ConversationConfig;
use super::initialize_node::InitializeNode;
use super::relevance_node::RelevanceNode;
use super::route::{ConversationNode, ConversationRoute};
use super::sale_analysis_node::SaleAnalysisNode;
use super::seller_node::SellerNode;
use super::state::ConversationState;
use super::tools_node::ToolsNode;

/// Outcome of one simulated conversation. `state` is the last merged state whatever the
/// status.
#[derive(Debug)]
pub struct ConversationResult {
    pub simulation_id: String,
    pub run_timestamp: DateTime<Utc>,
    pub state: ConversationState,
    pub status: ExecutionStatus,
    pub path: Vec<ConversationNode>,
}

impl ConversationResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, ExecutionStatus::Completed)
    }
}

/// Registers the six conversation nodes and compiles the graph.
pub fn build_conversation_graph(
    gateway: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolSource>,
    embedder: Arc<dyn Embedder>,
    config: Arc<ConversationConfig>,
) -> Result<CompiledStateGraph<ConversationState, ConversationRoute>, CompilationError> {
    let mut graph = StateGraph::<ConversationState, ConversationRoute>::new();
    graph
        .add_node(Arc::new(InitializeNode::new(Arc::clone(&config))))
        .add_node(Arc::new(SellerNode::new(
            Arc::clone(&gateway),
            Arc::clone(&tools),
            Arc::clone(&config),
        )))
        .add_node(Arc::new(ToolsNode::new(tools)))
        .add_node(Arc::new(BuyerNode::new(Arc::clone(&gateway), Arc::clone(&config))))
        .add_node(Arc::new(SaleAnalysisNode::new(gateway, config)))
        .add_node(Arc::new(RelevanceNode::new(embedder)))
        .set_entry(ConversationNode::Initialize);
    graph.compile()
}

pub struct ConversationRunner {
    compiled: CompiledStateGraph<ConversationState, ConversationRoute>,
    config: Arc<ConversationConfig>,
}

impl ConversationRunner {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tools: Arc<dyn ToolSource>,
        embedder: Arc<dyn Embedder>,
        config: ConversationConfig,
    ) -> Result<Self, CompilationError> {
        let config = Arc::new(config);
        let compiled = build_conversation_graph(gateway, tools, embedder, Arc::clone(&config))?;
        Ok(Self { compiled, config })
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    pub fn graph(&self) -> &CompiledStateGraph<ConversationState, ConversationRoute> {
        &self.compiled
    }

    fn limits(&self) -> RunLimits {
        RunLimits::unbounded().with_max_steps(self.config.recursion_limit)
    }

    /// Runs a conversation opened with the default greeting.
    pub async fn run(&self) -> ConversationResult {
        self.run_with(Vec::new()).await
    }

    /// Runs a conversation that starts from `messages`.
    pub async fn run_with(&self, messages: Vec<Message>) -> ConversationResult {
        let simulation_id = uuid::Uuid::new_v4().to_string();
        let run_timestamp = Utc::now();
        tracing::info!(
            simulation_id = %simulation_id,
            persona_id = ?self.config.persona_id,
            "conversation run start"
        );
        let execution = self
            .compiled
            .invoke(ConversationState::with_messages(messages), self.limits())
            .await;
        match &execution.status {
            ExecutionStatus::Failed(e) => {
                tracing::error!(simulation_id = %simulation_id, error = %e, "conversation failed")
            }
            status => tracing::info!(
                simulation_id = %simulation_id,
                status = ?status,
                messages = execution.state.messages.len(),
                sale = execution.state.sale_completed(),
                "conversation finished"
            ),
        }
        ConversationResult {
            simulation_id,
            run_timestamp,
            state: execution.state,
            status: execution.status,
            path: execution.path,
        }
    }

    /// Streams graph events, e.g. to persist each message as it is appended.
    pub fn stream(
        &self,
        messages: Vec<Message>,
    ) -> ReceiverStream<GraphEvent<ConversationState, ConversationRoute>> {
        self.compiled
            .stream(ConversationState::with_messages(messages), self.limits())
    }
}
