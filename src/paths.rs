//! Filesystem layout for refmatch
//!
//! ```text
//! ~/.refmatch/
//! ├── config.toml      # Default config file
//! └── corpus/          # Conventional home for reference sheets
//! ```

use std::path::{Path, PathBuf};

/// User's refmatch home directory: `~/.refmatch/`
pub fn refmatch_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".refmatch")
}

/// Default config file: `~/.refmatch/config.toml`
pub fn config_path() -> PathBuf {
    refmatch_home().join("config.toml")
}

/// Conventional corpus directory: `~/.refmatch/corpus/`
pub fn corpus_dir() -> PathBuf {
    refmatch_home().join("corpus")
}

/// Expand `~` and `$VAR` in a configured path
///
/// Falls back to the literal string if expansion fails (e.g. unset variable).
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => Path::new(path).to_path_buf(),
    }
}
