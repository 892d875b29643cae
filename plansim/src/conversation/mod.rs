//! Conversation simulator: a tool-using seller and a persona-driven buyer.
//!
//! The seller may call marketplace tools; their results loop back to the seller. When the
//! transcript suggests a purchase, or the message limit is reached, the conversation is
//! analyzed for a sale. A recorded sale is scored against the persona's product index.

mod buyer_node;
mod config;
mod initialize_node;
mod persona;
mod product_index;
mod prompt;
mod relevance_node;
mod route;
mod runner;
mod sale_analysis_node;
mod seller_node;
mod state;
mod tools_node;
mod turn;

pub use buyer_node::{BuyerNode, BUYER_FALLBACK_TAG, BUYER_TAG};
pub use config::{
    ConversationConfig, DEFAULT_CHAT_MODEL, DEFAULT_PERSONA_DIR, DEFAULT_RECURSION_LIMIT,
};
pub use initialize_node::InitializeNode;
pub use persona::{PersonaCatalog, PersonaError};
pub use product_index::{IndexedProduct, ProductIndex, ProductIndexError, TOP_K};
pub use prompt::{DEFAULT_SELLER_PROMPT, OPENING_MESSAGE};
pub use relevance_node::RelevanceNode;
pub use route::{
    has_sale_indicator, ConversationNode, ConversationRoute, KEYWORD_WINDOW,
    MIN_MESSAGES_FOR_SALE, SALE_KEYWORDS,
};
pub use runner::{build_conversation_graph, ConversationResult, ConversationRunner};
pub use sale_analysis_node::{
    extract_listing_details, sale_record, ListingDetails, SaleAnalysis, SaleAnalysisNode,
    ANALYSIS_WINDOW, REVIEW_THRESHOLD, UNKNOWN_ITEM,
};
pub use seller_node::{SellerNode, SELLER_FALLBACK_TAG, SELLER_TAG};
pub use state::{
    message_limit, ConversationState, ConversationUpdate, SaleRecord, DEFAULT_MAX_TURNS,
};
pub use tools_node::ToolsNode;
pub use turn::CHAT_TEMPERATURE;
