//! refmatch - rank a small reference corpus against free text
//!
//! Pipeline: `corpus` (documents) → `retrieval` (lexical or embedding
//! ranking, top-K selection) → `references` (citation block + links).
//! `embeddings` and `websearch` adapt external APIs; the binary adds the CLI
//! and the webhook server.

pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod lexical;
pub mod logging;
pub mod paths;
pub mod references;
pub mod retrieval;
pub mod websearch;

// Re-export commonly used types
pub use config::Config;
pub use corpus::{Corpus, Document, RawRecord};
pub use error::{CorpusLoadError, EmbeddingError};
pub use references::{Reference, ReferenceSet};
pub use retrieval::{EngineOptions, RankingMode, ReferenceEngine};
