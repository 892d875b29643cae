//! Persona catalog: buyer prompts and product indexes produced by the persona pipeline.
//!
//! A persona directory holds, per topic `<n>`:
//!
//! * `persona_topic_<n>_final_prompt.txt`: the buyer's system prompt (persona id `topic_<n>`)
//! * `persona_topic_<n>_top_purchases_nmf.csv`: the product index (optional)

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PROMPT_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^persona_topic_(\d+)_final_prompt\.txt$").expect("valid prompt file regex")
});

static PERSONA_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^topic_(\d+)$").expect("valid persona id regex"));

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("no persona prompt files in {}", .0.display())]
    NoneAvailable(PathBuf),
    #[error("invalid persona id {0:?}; expected topic_<n>")]
    InvalidId(String),
    #[error("persona prompt not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persona files in one directory.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    dir: PathBuf,
}

impl PersonaCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persona ids with a prompt file, ordered by topic number. Empty when the directory is
    /// missing.
    pub fn available_ids(&self) -> Result<Vec<String>, PersonaError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %self.dir.display(), "persona directory not found");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(PersonaError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        let mut topics: Vec<u64> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let caps = PROMPT_FILE.captures(name.to_str()?)?;
                caps[1].parse().ok()
            })
            .collect();
        topics.sort_unstable();
        Ok(topics.into_iter().map(|n| format!("topic_{}", n)).collect())
    }

    /// `id` when given, else the first available persona.
    pub fn resolve(&self, id: Option<&str>) -> Result<String, PersonaError> {
        if let Some(id) = id {
            return Ok(id.to_string());
        }
        self.available_ids()?
            .into_iter()
            .next()
            .ok_or_else(|| PersonaError::NoneAvailable(self.dir.clone()))
    }

    fn topic(id: &str) -> Result<&str, PersonaError> {
        PERSONA_ID
            .captures(id)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| PersonaError::InvalidId(id.to_string()))
    }

    pub fn prompt_path(&self, id: &str) -> Result<PathBuf, PersonaError> {
        let topic = Self::topic(id)?;
        Ok(self
            .dir
            .join(format!("persona_topic_{}_final_prompt.txt", topic)))
    }

    pub fn load_prompt(&self, id: &str) -> Result<String, PersonaError> {
        let path = self.prompt_path(id)?;
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PersonaError::NotFound(path)
            } else {
                PersonaError::Io { path, source }
            }
        })
    }

    /// Product index for `id`, only when the file exists.
    pub fn index_path(&self, id: &str) -> Option<PathBuf> {
        let topic = Self::topic(id).ok()?;
        let path = self
            .dir
            .join(format!("persona_topic_{}_top_purchases_nmf.csv", topic));
        if path.is_file() {
            Some(path)
        } else {
            tracing::warn!(persona_id = id, path = %path.display(), "product index not found");
            None
        }
    }
}
