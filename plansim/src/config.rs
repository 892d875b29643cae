//! Shared configuration plumbing for plan and conversation runs.
//!
//! Settings resolve with priority **environment variable > explicit value > config file
//! table > built-in default**. [`load_sources`] first applies `.env` and the XDG `[env]`
//! table to the process environment (never overriding variables already set), then returns
//! the typed file tables.

use std::fmt::Display;
use std::str::FromStr;

use env_config::FileSettings;
use thiserror::Error;

/// XDG directory and `.env` namespace.
pub const APP_NAME: &str = "plansim";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("load config: {0}")]
    Load(#[from] env_config::LoadError),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Looks a key up in some environment; the process env in production, a map in tests.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Non-empty process environment variable.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Applies `.env` / XDG `[env]` and returns the `[plan]` / `[conversation]` tables.
pub fn load_sources() -> Result<FileSettings, ConfigError> {
    env_config::load_and_apply(APP_NAME, None)?;
    Ok(env_config::load_file_settings(APP_NAME)?)
}

pub(crate) fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// String setting: env var, else explicit, else file.
pub(crate) fn pick_string(
    env: EnvLookup<'_>,
    key: &str,
    explicit: &Option<String>,
    file: &Option<String>,
) -> Option<String> {
    env(key).or_else(|| explicit.clone()).or_else(|| file.clone())
}

/// Parsed setting: env var (parsed), else explicit, else file.
pub(crate) fn pick_parsed<T>(
    env: EnvLookup<'_>,
    key: &str,
    explicit: Option<T>,
    file: Option<T>,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env(key) {
        Some(raw) => parse_value(key, &raw).map(Some),
        None => Ok(explicit.or(file)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |k| {
            pairs
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.to_string())
        }
    }

    /// **Scenario**: env beats explicit beats file.
    #[test]
    fn pick_string_priority() {
        let env = env_with(&[("TOPIC", "Env")]);
        let none = env_with(&[]);
        let explicit = Some("Explicit".to_string());
        let file = Some("File".to_string());
        assert_eq!(pick_string(&env, "TOPIC", &explicit, &file).as_deref(), Some("Env"));
        assert_eq!(pick_string(&none, "TOPIC", &explicit, &file).as_deref(), Some("Explicit"));
        assert_eq!(pick_string(&none, "TOPIC", &None, &file).as_deref(), Some("File"));
        assert_eq!(pick_string(&none, "TOPIC", &None, &None), None);
    }

    /// **Scenario**: An unparsable env value is an Invalid error naming key and value.
    #[test]
    fn pick_parsed_reports_bad_env_value() {
        let env = env_with(&[("MAX_ROUNDS", "ten")]);
        let err = pick_parsed::<usize>(&env, "MAX_ROUNDS", Some(3), None).unwrap_err();
        let s = err.to_string();
        assert!(s.contains("MAX_ROUNDS") && s.contains("ten"), "{}", s);
        let ok = env_with(&[("MAX_ROUNDS", " 4 ")]);
        assert_eq!(pick_parsed::<usize>(&ok, "MAX_ROUNDS", Some(3), None).unwrap(), Some(4));
    }
}
