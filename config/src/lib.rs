//! Configuration sources for plansim runs.
//!
//! Two entry points:
//!
//! * [`load_and_apply`] copies `.env` and the XDG `[env]` table into the process environment
//!   with priority **existing env > .env > XDG**. Run settings are then resolved from env vars
//!   (`TOPIC`, `THINKING_MODEL`, `MAX_ROUNDS`, ...) by the core crate.
//! * [`load_file_settings`] returns the typed `[plan]` and `[conversation]` tables of
//!   `$XDG_CONFIG_HOME/<app>/config.toml`, used as the lowest-priority defaults.
//!
//! ```toml
//! [env]
//! THINKING_MODEL = "gpt-4o-mini"
//!
//! [plan]
//! topic = "Plumbing"
//! max_rounds = 10
//!
//! [conversation]
//! persona_dir = "/data/personas"
//! max_turns = 10
//! ```

mod dotenv;
mod xdg_toml;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// `[plan]` table: defaults for plan simulation runs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanSection {
    pub topic: Option<String>,
    pub subtopic: Option<String>,
    pub thinking_model: Option<String>,
    pub max_rounds: Option<usize>,
    pub novelty_threshold: Option<f32>,
    /// `"global"` or `"per_plan"`.
    pub novelty_scope: Option<String>,
}

/// `[conversation]` table: defaults for buyer/seller simulation runs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConversationSection {
    pub persona_id: Option<String>,
    pub persona_dir: Option<PathBuf>,
    pub chat_model: Option<String>,
    pub max_turns: Option<usize>,
    pub recursion_limit: Option<usize>,
    pub seller_prompt: Option<String>,
}

/// Typed tables of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub plan: PlanSection,
    pub conversation: ConversationSection,
}

/// Sets environment variables from `.env` and the XDG `[env]` table, only for keys that are
/// **not** already set.
///
/// * `app_name`: XDG directory name, e.g. `"plansim"` for `~/.config/plansim/config.toml`.
/// * `override_dir`: directory holding `.env`; `None` uses the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;

    let keys: HashSet<&String> = xdg_map.keys().chain(dotenv_map.keys()).collect();
    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(value) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}

/// Typed `[plan]` / `[conversation]` tables for `app_name`; defaults when the file is absent.
pub fn load_file_settings(app_name: &str) -> Result<FileSettings, LoadError> {
    xdg_toml::load_settings(app_name)
}

/// Location of the config file that would be read for `app_name`, if it exists.
pub fn config_file_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    xdg_toml::config_path(app_name)
}

#[cfg(test)]
pub(crate) mod test_env {
    //! Env mutation is process-global; tests touching it serialize on one lock.

    use std::path::Path;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Runs `f` with `XDG_CONFIG_HOME` pointing at `dir`, restoring the previous value after.
    pub fn with_xdg_home<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let prev = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", dir);
        let out = f();
        match prev {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        out
    }

    pub fn write_app_config(xdg_home: &Path, app: &str, body: &str) {
        let app_dir = xdg_home.join(app);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), body).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_env::{with_xdg_home, write_app_config};
    use super::*;
    use std::env;

    /// **Scenario**: A variable already in the environment is never overwritten.
    #[test]
    fn existing_env_wins() {
        let xdg = tempfile::tempdir().unwrap();
        write_app_config(xdg.path(), "plansim", "[env]\nPLANSIM_TEST_EXISTING = \"xdg\"\n");
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(dotenv_dir.path().join(".env"), "PLANSIM_TEST_EXISTING=dotenv\n").unwrap();

        let val = with_xdg_home(xdg.path(), || {
            env::set_var("PLANSIM_TEST_EXISTING", "process");
            load_and_apply("plansim", Some(dotenv_dir.path())).unwrap();
            let v = env::var("PLANSIM_TEST_EXISTING").unwrap();
            env::remove_var("PLANSIM_TEST_EXISTING");
            v
        });
        assert_eq!(val, "process");
    }

    /// **Scenario**: `.env` beats the XDG `[env]` table; XDG-only keys still apply.
    #[test]
    fn dotenv_beats_xdg_and_xdg_fills_gaps() {
        let xdg = tempfile::tempdir().unwrap();
        write_app_config(
            xdg.path(),
            "plansim",
            "[env]\nPLANSIM_TEST_PRIORITY = \"xdg\"\nPLANSIM_TEST_XDG_ONLY = \"xdg\"\n",
        );
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(dotenv_dir.path().join(".env"), "PLANSIM_TEST_PRIORITY=dotenv\n").unwrap();

        let (priority, xdg_only) = with_xdg_home(xdg.path(), || {
            env::remove_var("PLANSIM_TEST_PRIORITY");
            env::remove_var("PLANSIM_TEST_XDG_ONLY");
            load_and_apply("plansim", Some(dotenv_dir.path())).unwrap();
            let out = (
                env::var("PLANSIM_TEST_PRIORITY").unwrap(),
                env::var("PLANSIM_TEST_XDG_ONLY").unwrap(),
            );
            env::remove_var("PLANSIM_TEST_PRIORITY");
            env::remove_var("PLANSIM_TEST_XDG_ONLY");
            out
        });
        assert_eq!(priority, "dotenv");
        assert_eq!(xdg_only, "xdg");
    }

    #[test]
    fn no_sources_is_ok() {
        let xdg = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        let r = with_xdg_home(xdg.path(), || load_and_apply("plansim", Some(empty.path())));
        assert!(r.is_ok());
    }

    /// **Scenario**: A broken config file fails both entry points with `XdgParse`.
    #[test]
    fn invalid_toml_fails_both_entry_points() {
        let xdg = tempfile::tempdir().unwrap();
        write_app_config(xdg.path(), "plansim", "invalid [[[\n");
        let empty = tempfile::tempdir().unwrap();
        let (apply, settings) = with_xdg_home(xdg.path(), || {
            (
                load_and_apply("plansim", Some(empty.path())),
                load_file_settings("plansim"),
            )
        });
        assert!(matches!(apply, Err(LoadError::XdgParse(_))));
        assert!(matches!(settings, Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn config_file_path_reports_existing_file_only() {
        let xdg = tempfile::tempdir().unwrap();
        let (missing, present) = with_xdg_home(xdg.path(), || {
            let missing = config_file_path("plansim").unwrap();
            write_app_config(xdg.path(), "plansim", "[plan]\n");
            (missing, config_file_path("plansim").unwrap())
        });
        assert!(missing.is_none());
        assert_eq!(present, Some(xdg.path().join("plansim").join("config.toml")));
    }
}
