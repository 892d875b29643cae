//! Chat turn with a fallback: the full request first, then a brief tool-less request on the
//! tail of the transcript. Both failing is reported to the caller, which writes an apology
//! instead of failing the run.

use crate::llm::{CallParams, ChatRequest, GatewayError, LlmGateway, LlmResponse};
use crate::message::Message;

use super::prompt::FALLBACK_WINDOW;

/// Sampling temperature of seller and buyer turns.
pub const CHAT_TEMPERATURE: f32 = 0.7;

/// Characters of an error kept in apology messages.
const ERROR_SNIPPET: usize = 100;

pub(crate) enum TurnReply {
    Primary(LlmResponse),
    Fallback(LlmResponse),
}

pub(crate) fn chat_params(model: &str) -> CallParams {
    CallParams::new(model).temperature(CHAT_TEMPERATURE)
}

/// `[system, tail of transcript]` for the fallback request.
pub(crate) fn fallback_messages(system: &str, transcript: &[Message]) -> Vec<Message> {
    let tail = &transcript[transcript.len().saturating_sub(FALLBACK_WINDOW)..];
    let mut messages = Vec::with_capacity(tail.len() + 1);
    messages.push(Message::system(system));
    messages.extend(tail.iter().cloned());
    messages
}

pub(crate) fn error_snippet(error: &GatewayError) -> String {
    error.to_string().chars().take(ERROR_SNIPPET).collect()
}

/// Runs `primary`, then `fallback` if it fails. Returns the primary error when both fail.
pub(crate) async fn chat_with_fallback(
    gateway: &dyn LlmGateway,
    primary: ChatRequest,
    fallback: ChatRequest,
) -> Result<TurnReply, GatewayError> {
    let tag = primary.tag.clone();
    let error = match gateway.chat(primary).await {
        Ok(reply) => return Ok(TurnReply::Primary(reply)),
        Err(e) => e,
    };
    tracing::warn!(tag = %tag, error = %error, "chat turn failed; trying fallback");
    match gateway.chat(fallback).await {
        Ok(reply) => Ok(TurnReply::Fallback(reply)),
        Err(fallback_error) => {
            tracing::warn!(tag = %tag, error = %fallback_error, "fallback turn failed");
            Err(error)
        }
    }
}
