//! Read `$XDG_CONFIG_HOME/<app>/config.toml`: the `[env]` table plus typed run defaults.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::{FileSettings, LoadError};

/// Config root: `$XDG_CONFIG_HOME` when set and non-empty, else the platform config dir.
fn config_home() -> Result<PathBuf, LoadError> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => dirs::config_dir()
            .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into())),
    }
}

/// Path of the app's `config.toml`, or `None` when the file does not exist.
pub(crate) fn config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    Ok(path.is_file().then_some(path))
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(flatten)]
    settings: FileSettings,
}

fn read_config_file(app_name: &str) -> Result<ConfigFile, LoadError> {
    let Some(path) = config_path(app_name)? else {
        return Ok(ConfigFile::default());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    Ok(toml::from_str(&content)?)
}

/// `[env]` pairs. Missing file or section yields an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    Ok(read_config_file(app_name)?.env)
}

/// `[plan]` and `[conversation]` tables. Missing file or sections yield defaults (all `None`).
pub fn load_settings(app_name: &str) -> Result<FileSettings, LoadError> {
    Ok(read_config_file(app_name)?.settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::{with_xdg_home, write_app_config};

    /// **Scenario**: An app without a config file yields an empty env map and default settings.
    #[test]
    fn missing_config_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        with_xdg_home(dir.path(), || {
            assert!(load_env_map("plansim-missing").unwrap().is_empty());
            assert_eq!(load_settings("plansim-missing").unwrap(), FileSettings::default());
        });
    }

    /// **Scenario**: `[env]` pairs are returned verbatim.
    #[test]
    fn env_table_is_read() {
        let dir = tempfile::tempdir().unwrap();
        write_app_config(
            dir.path(),
            "envapp",
            "[env]\nTOPIC = \"Plumbing\"\nTHINKING_MODEL = \"small\"\n",
        );
        let map = with_xdg_home(dir.path(), || load_env_map("envapp")).unwrap();
        assert_eq!(map.get("TOPIC"), Some(&"Plumbing".to_string()));
        assert_eq!(map.get("THINKING_MODEL"), Some(&"small".to_string()));
    }

    /// **Scenario**: Typed tables are parsed next to `[env]`; absent keys stay `None`.
    #[test]
    fn plan_and_conversation_tables_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        write_app_config(
            dir.path(),
            "typed",
            r#"
[env]
UNRELATED = "x"

[plan]
topic = "Gardening"
max_rounds = 7
novelty_threshold = 0.9

[conversation]
persona_id = "topic_3"
max_turns = 4
"#,
        );
        let settings = with_xdg_home(dir.path(), || load_settings("typed")).unwrap();
        assert_eq!(settings.plan.topic.as_deref(), Some("Gardening"));
        assert_eq!(settings.plan.max_rounds, Some(7));
        assert_eq!(settings.plan.novelty_threshold, Some(0.9));
        assert!(settings.plan.thinking_model.is_none());
        assert_eq!(settings.conversation.persona_id.as_deref(), Some("topic_3"));
        assert_eq!(settings.conversation.max_turns, Some(4));
        assert!(settings.conversation.persona_dir.is_none());
    }

    /// **Scenario**: Malformed TOML surfaces as `LoadError::XdgParse`.
    #[test]
    fn invalid_toml_returns_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_app_config(dir.path(), "badapp", "not valid toml [[[\n");
        let result = with_xdg_home(dir.path(), || load_settings("badapp"));
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }

    /// **Scenario**: A wrongly typed value in a typed table is a parse error, not a silent default.
    #[test]
    fn wrong_type_in_plan_table_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_app_config(dir.path(), "wrongtype", "[plan]\nmax_rounds = \"ten\"\n");
        let result = with_xdg_home(dir.path(), || load_settings("wrongtype"));
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}
