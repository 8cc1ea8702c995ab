//! Error taxonomy for the reference engine
//!
//! Only two conditions are real errors:
//! - `CorpusLoadError` is fatal at startup (no partial service)
//! - `EmbeddingError` is always recovered by the lexical fallback
//!
//! "No relevant references" is an ordinary outcome and has no error type.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Corpus source could not be turned into a usable corpus
#[derive(Debug, Error)]
pub enum CorpusLoadError {
    #[error("failed to read corpus source {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported corpus format for {path} (expected .csv or .json)")]
    UnsupportedFormat { path: PathBuf },

    #[error("corpus {path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("malformed corpus {path} at record {record}: {message}")]
    Malformed {
        path: PathBuf,
        record: usize,
        message: String,
    },

    #[error("document embeddings disagree on dimension: expected {expected}, record {record} has {found}")]
    DimensionMismatch {
        expected: usize,
        found: usize,
        record: usize,
    },
}

/// Embedding provider failed; callers fall back to lexical scoring
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding call exceeded {0:?}")]
    Timeout(Duration),

    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("embedding has dimension {found}, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("embedding provider not configured: {0}")]
    Unconfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_error_messages_name_the_source() {
        let err = CorpusLoadError::MissingColumn {
            path: PathBuf::from("refs.csv"),
            column: "APA",
        };
        let msg = err.to_string();
        assert!(msg.contains("refs.csv"));
        assert!(msg.contains("APA"));
    }

    #[test]
    fn test_timeout_message() {
        let err = EmbeddingError::Timeout(Duration::from_secs(4));
        assert!(err.to_string().contains("4s"));
    }
}
