//! Plan run configuration. Immutable for the duration of a run; nodes share it via `Arc`.

use std::fmt;
use std::str::FromStr;

use env_config::PlanSection;
use serde::{Deserialize, Serialize};

use crate::config::{self, pick_parsed, pick_string, ConfigError, EnvLookup};
use crate::memory::BucketKey;

pub const DEFAULT_TOPIC: &str = "Hacking";
pub const DEFAULT_THINKING_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_ROUNDS: usize = 10;
pub const DEFAULT_NOVELTY_THRESHOLD: f32 = 0.8;

/// Which ideas a novelty lookup compares against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoveltyScope {
    /// Every plan's ideas for the same round index.
    #[default]
    Global,
    /// Only this plan's ideas for the same round index.
    PerPlan,
}

impl FromStr for NoveltyScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(NoveltyScope::Global),
            "per_plan" => Ok(NoveltyScope::PerPlan),
            other => Err(format!("expected \"global\" or \"per_plan\", got {:?}", other)),
        }
    }
}

impl fmt::Display for NoveltyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoveltyScope::Global => "global",
            NoveltyScope::PerPlan => "per_plan",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Used as the plan id when set.
    pub run_id: Option<String>,
    pub topic: String,
    pub subtopic: Option<String>,
    pub thinking_model: String,
    /// Rounds allowed before the run stops with a limit status.
    pub max_rounds: usize,
    pub novelty_threshold: f32,
    pub novelty_scope: NoveltyScope,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            run_id: None,
            topic: DEFAULT_TOPIC.to_string(),
            subtopic: None,
            thinking_model: DEFAULT_THINKING_MODEL.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            novelty_threshold: DEFAULT_NOVELTY_THRESHOLD,
            novelty_scope: NoveltyScope::Global,
        }
    }
}

impl PlanConfig {
    /// Resolves every field from env var (`RUN_ID`, `TOPIC`, `SUBTOPIC`, `THINKING_MODEL`,
    /// `MAX_ROUNDS`, `NOVELTY_THRESHOLD`, `NOVELTY_SCOPE`), then `explicit`, then `file`, then
    /// the default.
    pub fn resolve(
        explicit: &PlanSection,
        file: &PlanSection,
        env: EnvLookup<'_>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let novelty_scope = match pick_string(
            env,
            "NOVELTY_SCOPE",
            &explicit.novelty_scope,
            &file.novelty_scope,
        ) {
            Some(raw) => config::parse_value("NOVELTY_SCOPE", &raw)?,
            None => defaults.novelty_scope,
        };
        let cfg = Self {
            run_id: pick_string(env, "RUN_ID", &None, &None),
            topic: pick_string(env, "TOPIC", &explicit.topic, &file.topic)
                .unwrap_or(defaults.topic),
            subtopic: pick_string(env, "SUBTOPIC", &explicit.subtopic, &file.subtopic),
            thinking_model: pick_string(
                env,
                "THINKING_MODEL",
                &explicit.thinking_model,
                &file.thinking_model,
            )
            .unwrap_or(defaults.thinking_model),
            max_rounds: pick_parsed(env, "MAX_ROUNDS", explicit.max_rounds, file.max_rounds)?
                .unwrap_or(defaults.max_rounds),
            novelty_threshold: pick_parsed(
                env,
                "NOVELTY_THRESHOLD",
                explicit.novelty_threshold,
                file.novelty_threshold,
            )?
            .unwrap_or(defaults.novelty_threshold),
            novelty_scope,
        };
        cfg.validate()
    }

    /// Applies `.env` / XDG sources, then resolves against the process environment.
    pub fn load(explicit: &PlanSection) -> Result<Self, ConfigError> {
        let file = config::load_sources()?;
        Self::resolve(explicit, &file.plan, &config::process_env)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid {
                key: "max_rounds".into(),
                value: "0".into(),
                reason: "at least one round is required".into(),
            });
        }
        if !(self.novelty_threshold > 0.0 && self.novelty_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "novelty_threshold".into(),
                value: self.novelty_threshold.to_string(),
                reason: "must be in (0, 1]".into(),
            });
        }
        Ok(self)
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_novelty_scope(mut self, scope: NoveltyScope) -> Self {
        self.novelty_scope = scope;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Topic line for prompts, with the subtopic when one is set.
    pub fn topic_label(&self) -> String {
        match &self.subtopic {
            Some(sub) => format!("{} ({})", self.topic, sub),
            None => self.topic.clone(),
        }
    }

    /// Novelty bucket for `round` of plan `plan_id` under the configured scope.
    pub fn bucket(&self, plan_id: &str, round: usize) -> BucketKey {
        match self.novelty_scope {
            NoveltyScope::Global => BucketKey::global(round),
            NoveltyScope::PerPlan => BucketKey::scoped(plan_id, round),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    /// **Scenario**: With no sources the defaults apply.
    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = PlanConfig::resolve(&PlanSection::default(), &PlanSection::default(), &no_env)
            .unwrap();
        assert_eq!(cfg, PlanConfig::default());
        assert_eq!(cfg.topic, "Hacking");
        assert_eq!(cfg.thinking_model, "gpt-4o-mini");
    }

    /// **Scenario**: Env overrides explicit values, which override the file table.
    #[test]
    fn env_overrides_explicit_overrides_file() {
        let explicit = PlanSection {
            topic: Some("Plumbing".into()),
            max_rounds: Some(3),
            ..Default::default()
        };
        let file = PlanSection {
            topic: Some("Gardening".into()),
            thinking_model: Some("file-model".into()),
            max_rounds: Some(9),
            novelty_scope: Some("per_plan".into()),
            ..Default::default()
        };
        let env = |k: &str| (k == "TOPIC").then(|| "Cooking".to_string());
        let cfg = PlanConfig::resolve(&explicit, &file, &env).unwrap();
        assert_eq!(cfg.topic, "Cooking");
        assert_eq!(cfg.max_rounds, 3);
        assert_eq!(cfg.thinking_model, "file-model");
        assert_eq!(cfg.novelty_scope, NoveltyScope::PerPlan);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero = PlanSection {
            max_rounds: Some(0),
            ..Default::default()
        };
        assert!(PlanConfig::resolve(&zero, &PlanSection::default(), &no_env).is_err());
        let env = |k: &str| (k == "NOVELTY_SCOPE").then(|| "everywhere".to_string());
        assert!(PlanConfig::resolve(&PlanSection::default(), &PlanSection::default(), &env).is_err());
        let env = |k: &str| (k == "NOVELTY_THRESHOLD").then(|| "1.5".to_string());
        assert!(PlanConfig::resolve(&PlanSection::default(), &PlanSection::default(), &env).is_err());
    }

    #[test]
    fn bucket_follows_scope() {
        let cfg = PlanConfig::default();
        assert_eq!(cfg.bucket("p", 2), BucketKey::global(2));
        let cfg = cfg.with_novelty_scope(NoveltyScope::PerPlan);
        assert_eq!(cfg.bucket("p", 2), BucketKey::scoped("p", 2));
    }

    #[test]
    fn topic_label_includes_subtopic() {
        let mut cfg = PlanConfig::default().with_topic("Plumbing");
        assert_eq!(cfg.topic_label(), "Plumbing");
        cfg.subtopic = Some("faucets".into());
        assert_eq!(cfg.topic_label(), "Plumbing (faucets)");
    }
}
