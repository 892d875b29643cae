//! Conversation run configuration.

use std::path::PathBuf;

use env_config::ConversationSection;
use serde::{Deserialize, Serialize};

use crate::config::{self, pick_parsed, pick_string, ConfigError, EnvLookup};

use super::prompt::DEFAULT_SELLER_PROMPT;
use super::state::{message_limit, DEFAULT_MAX_TURNS};

pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash-001";
pub const DEFAULT_PERSONA_DIR: &str = "personas";
/// Node executions allowed per conversation.
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Buyer persona; the first available one when unset.
    pub persona_id: Option<String>,
    pub persona_dir: PathBuf,
    pub chat_model: String,
    /// Turns per side.
    pub max_turns: usize,
    pub recursion_limit: usize,
    pub seller_prompt: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            persona_id: None,
            persona_dir: PathBuf::from(DEFAULT_PERSONA_DIR),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            seller_prompt: DEFAULT_SELLER_PROMPT.trim().to_string(),
        }
    }
}

impl ConversationConfig {
    /// Resolves from env var (`PERSONA_ID`, `PERSONA_DIR`, `CHAT_MODEL`, `MAX_TURNS`,
    /// `RECURSION_LIMIT`), then `explicit`, then `file`, then the default. The seller prompt
    /// has no env override.
    pub fn resolve(
        explicit: &ConversationSection,
        file: &ConversationSection,
        env: EnvLookup<'_>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let path_str = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
        let cfg = Self {
            persona_id: pick_string(env, "PERSONA_ID", &explicit.persona_id, &file.persona_id),
            persona_dir: pick_string(
                env,
                "PERSONA_DIR",
                &path_str(&explicit.persona_dir),
                &path_str(&file.persona_dir),
            )
            .map_or(defaults.persona_dir, PathBuf::from),
            chat_model: pick_string(env, "CHAT_MODEL", &explicit.chat_model, &file.chat_model)
                .unwrap_or(defaults.chat_model),
            max_turns: pick_parsed(env, "MAX_TURNS", explicit.max_turns, file.max_turns)?
                .unwrap_or(defaults.max_turns),
            recursion_limit: pick_parsed(
                env,
                "RECURSION_LIMIT",
                explicit.recursion_limit,
                file.recursion_limit,
            )?
            .unwrap_or(defaults.recursion_limit),
            seller_prompt: explicit
                .seller_prompt
                .clone()
                .or_else(|| file.seller_prompt.clone())
                .unwrap_or(defaults.seller_prompt),
        };
        if cfg.recursion_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "recursion_limit".into(),
                value: "0".into(),
                reason: "at least one step is required".into(),
            });
        }
        Ok(cfg)
    }

    pub fn load(explicit: &ConversationSection) -> Result<Self, ConfigError> {
        let file = config::load_sources()?;
        Self::resolve(explicit, &file.conversation, &config::process_env)
    }

    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    pub fn with_persona_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persona_dir = dir.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn message_limit(&self) -> usize {
        message_limit(self.max_turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults() {
        let cfg = ConversationConfig::resolve(
            &ConversationSection::default(),
            &ConversationSection::default(),
            &no_env,
        )
        .unwrap();
        assert_eq!(cfg.max_turns, 10);
        assert_eq!(cfg.message_limit(), 21);
        assert_eq!(cfg.recursion_limit, 100);
        assert!(cfg.seller_prompt.contains("ebay_search_tool"));
    }

    /// **Scenario**: PERSONA_ID in the environment beats the file table.
    #[test]
    fn env_wins_over_file() {
        let file = ConversationSection {
            persona_id: Some("topic_1".into()),
            persona_dir: Some("/data/personas".into()),
            max_turns: Some(4),
            ..Default::default()
        };
        let env = |k: &str| (k == "PERSONA_ID").then(|| "topic_9".to_string());
        let cfg = ConversationConfig::resolve(&ConversationSection::default(), &file, &env).unwrap();
        assert_eq!(cfg.persona_id.as_deref(), Some("topic_9"));
        assert_eq!(cfg.persona_dir, PathBuf::from("/data/personas"));
        assert_eq!(cfg.message_limit(), 9);
    }

    #[test]
    fn zero_recursion_limit_is_invalid() {
        let explicit = ConversationSection {
            recursion_limit: Some(0),
            ..Default::default()
        };
        assert!(
            ConversationConfig::resolve(&explicit, &ConversationSection::default(), &no_env).is_err()
        );
    }
}
