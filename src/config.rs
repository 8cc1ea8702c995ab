//! Configuration for refmatch
//!
//! Loaded from TOML (`~/.refmatch/config.toml` unless `--config` is given).
//! A missing default file means built-in defaults. A few environment
//! variables override the file so container deployments need no file at all:
//! `PORT`, `REFMATCH_CORPUS`, `REFMATCH_BASE_URL`.
//!
//! Secrets are never stored here: sections name the environment variable
//! holding each key.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lexical::LexicalPolicy;
use crate::paths;
use crate::retrieval::RankingMode;

/// Default number of references returned per query
pub const DEFAULT_TOP_K: usize = 3;

/// Default deadline for one embedding or search call
pub const DEFAULT_TIMEOUT_SECS: u64 = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusSection,
    pub ranking: RankingSection,
    pub embeddings: EmbeddingsSection,
    pub search: SearchSection,
    pub serve: ServeSection,
}

/// Where the reference documents come from and where their files live
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSection {
    /// CSV or JSON corpus file
    pub path: Option<String>,
    /// Base location for resolving relative links (bucket URL, file server)
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSection {
    pub top_k: usize,
    pub mode: RankingMode,
    pub lexical_policy: LexicalPolicy,
    /// Embedding matches at or below this cosine are not references
    pub min_similarity: f32,
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            mode: RankingMode::default(),
            lexical_policy: LexicalPolicy::default(),
            min_similarity: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsSection {
    pub enabled: bool,
    /// OpenAI-compatible base URL (`/embeddings` is appended)
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Requested/expected vector length (None = whatever the model returns)
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dimensions: None,
        }
    }
}

impl EmbeddingsSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// External link lookup appended to webhook replies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key_env: String,
    pub engine_id_env: String,
    pub timeout_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            engine_id_env: "GOOGLE_CSE_ID".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SearchSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. The default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = paths::config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config TOML")
    }

    /// Apply environment overrides through a lookup function (testable)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.serve.port = port;
        }
        if let Some(path) = lookup("REFMATCH_CORPUS").filter(|p| !p.trim().is_empty()) {
            self.corpus.path = Some(path);
        }
        if let Some(base) = lookup("REFMATCH_BASE_URL") {
            self.corpus.base_url = base;
        }
    }

    /// Corpus file with `~`/`$VAR` expanded
    ///
    /// A relative path that does not exist from the working directory is
    /// looked up in `~/.refmatch/corpus/`.
    pub fn corpus_path(&self) -> Option<PathBuf> {
        let path = paths::expand(self.corpus.path.as_deref()?);
        if path.is_relative() && !path.exists() {
            let shelved = paths::corpus_dir().join(&path);
            if shelved.exists() {
                return Some(shelved);
            }
        }
        Some(path)
    }
}
