//! # plansim
//!
//! LLM-driven simulators built on one typed state graph.
//!
//! - **Plan simulator** ([`plan`]): an LLM proposes a step toward a goal, judges it, records
//!   what it revealed and cost, then checks the goal or considers abandoning. Ideas are kept
//!   novel per round through a [`NoveltyStore`].
//! - **Conversation simulator** ([`conversation`]): a tool-using seller and a persona-driven
//!   buyer talk until the message limit; sales are detected, recorded once and scored against
//!   the persona's product index.
//!
//! ## Design
//!
//! - **Typed routes**: every node returns a partial update and an explicit route. Each graph's
//!   route enum names the emitting node, and its successor table is checked when the graph is
//!   compiled and on every transition ([`Route`], [`StateGraph::compile`]).
//! - **Per-field merges**: state types declare each field once with `append`, `replace` or
//!   `set_once` through [`state_update!`]; omitted fields are never touched.
//! - **Bounded runs**: [`RunLimits`] caps steps and rounds; hitting a cap is its own
//!   [`ExecutionStatus`], distinct from completion and failure.
//! - **Seams, not vendors**: nodes talk to [`LlmGateway`], [`NoveltyStore`], [`Embedder`] and
//!   [`ToolSource`]. [`MockGateway`], [`InMemoryNoveltyStore`], [`HashingEmbedder`] and
//!   [`MockToolSource`] serve tests and offline runs.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Route`], [`Next`], visualization.
//! - [`channels`]: [`MergePolicy`], [`StateUpdate`], [`GraphState`].
//! - [`llm`]: [`LlmGateway`], [`StructuredOutput`], [`invoke_structured`], [`RetryingGateway`].
//! - [`memory`]: [`NoveltyStore`], [`Embedder`], [`cosine_similarity`].
//! - [`tool_source`]: [`ToolSource`], [`ToolSpec`], the seller tool names.
//! - [`plan`]: [`Plan`], [`PlanRunner`], [`PlanConfig`].
//! - [`conversation`]: [`ConversationState`], [`ConversationRunner`], [`ConversationConfig`].
//! - [`stream`]: [`GraphEvent`].
//! - [`config`]: `.env` / XDG loading and setting resolution.

pub mod channels;
pub mod config;
pub mod conversation;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod plan;
pub mod stream;
pub mod tool_source;

pub use channels::{GraphState, MergePolicy, MergeReport, StateUpdate};
pub use config::ConfigError;
pub use conversation::{
    ConversationConfig, ConversationResult, ConversationRunner, ConversationState, SaleRecord,
};
pub use error::AgentError;
pub use graph::{
    generate_dot, generate_text, CompilationError, CompiledStateGraph, Execution,
    ExecutionStatus, Limit, Next, Node, NodeOutput, Route, RunLimits, StateGraph, END,
};
pub use llm::{
    invoke_structured, CallParams, ChatRequest, GatewayError, LlmGateway, LlmResponse,
    MockGateway, RetryPolicy, RetryingGateway, StructuredOutput, StructuredRequest,
};
pub use memory::{
    cosine_similarity, BucketKey, Embedder, HashingEmbedder, InMemoryNoveltyStore, NoveltyStore,
    StoreError,
};
pub use message::{Message, ToolCall};
pub use plan::{
    InputState, Plan, PlanConfig, PlanRunResult, PlanRunner, PlanTermination,
};
pub use stream::GraphEvent;
pub use tool_source::{MockToolSource, ToolSource, ToolSourceError, ToolSpec};
