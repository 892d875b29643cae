//! Prompt text for the conversation agents and the sale analyst.

use crate::message::{render_transcript, Message};

/// Seller system prompt used when none is configured.
pub const DEFAULT_SELLER_PROMPT: &str = concat!(
    "You are a helpful and knowledgeable marketplace sales assistant.\n",
    "Understand what the customer needs, find suitable products with your tools, and guide ",
    "them towards a purchase decision when appropriate.\n\n",
    "Tools:\n",
    "- ebay_search_tool: search listings for the customer's refined needs. Always show the ",
    "item ids from the results.\n",
    "- answer_item_question_tool: get a summary of one item by its id. Use it when the ",
    "customer is interested in a specific item.\n\n",
    "Ask clarifying questions before searching. Do not repeat a search without new input. ",
    "Reply EITHER with a message to the customer OR with a call to ONE tool, never both.\n",
);

/// System prompt of the seller's tool-less fallback turn.
pub const SELLER_FALLBACK_PROMPT: &str =
    "You are a helpful salesperson. Respond briefly and professionally.";

/// System prompt of the buyer's fallback turn.
pub const BUYER_FALLBACK_PROMPT: &str =
    "You are a customer. Ask a simple question about a product.";

/// First buyer message when a conversation starts empty.
pub const OPENING_MESSAGE: &str = "Hello, I'm interested in your products.";

/// Messages handed to a fallback turn.
pub const FALLBACK_WINDOW: usize = 3;

pub fn buyer_system(persona_prompt: &str, transcript: &[Message]) -> String {
    format!(
        "{persona}\n\n\
         You are acting as the customer described above. Continue the conversation naturally \
         based on the history below. Focus on your persona's goals and interests. Reply with \
         your message only, without a preamble like \"Buyer:\".\n\n\
         Conversation history:\n{history}",
        persona = persona_prompt.trim(),
        history = render_transcript(transcript),
    )
}

pub fn sale_analysis(recent: &[Message]) -> String {
    format!(
        "You analyze conversations between a buyer and a seller. Decide whether the buyer \
         clearly agreed to purchase a specific item: an explicit wish to buy, order or check \
         out, or a firm decision such as \"I'll take it\" or \"add it to my cart\". General \
         interest, questions or possible future interest are not a sale.\n\n\
         If there is a sale, extract the item id (format v1|...|...), the item name and the \
         price as a number. Give your confidence between 0 and 1.\n\n\
         Messages:\n{}",
        render_transcript(recent)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_source::{TOOL_ITEM_QUESTION, TOOL_PRODUCT_SEARCH};

    #[test]
    fn buyer_prompt_embeds_persona_and_history() {
        let p = buyer_system(
            "  You are a budget-minded DIY homeowner.  ",
            &[Message::user("hi"), Message::assistant("hello, how can I help?")],
        );
        assert!(p.starts_with("You are a budget-minded DIY homeowner."));
        assert!(p.contains("assistant: hello, how can I help?"));
    }

    #[test]
    fn seller_prompt_names_both_tools() {
        assert!(DEFAULT_SELLER_PROMPT.contains(TOOL_PRODUCT_SEARCH));
        assert!(DEFAULT_SELLER_PROMPT.contains(TOOL_ITEM_QUESTION));
    }
}
