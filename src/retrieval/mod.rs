//! Retrieval module - rank corpus documents for a query and pick the top K
//!
//! Public interface:
//! - `ReferenceEngine` runs the whole pipeline (embed query, rank, select, render)
//! - `Ranker` with the `LexicalRanker` and `EmbeddingRanker` strategies
//! - `select_top_k` for filtering, dedup and truncation
//! - `Query`, `ScoredMatch`, `ScoreKind`, `RankingMode`

mod engine;
mod query;
mod ranker;
mod selector;

pub use engine::{EngineOptions, ReferenceEngine};
pub use query::Query;
pub use ranker::{EmbeddingRanker, LexicalRanker, Ranker, ScoreKind, ScoredMatch};
pub use selector::select_top_k;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which ranking strategy the engine uses
///
/// `Embedding` uses cosine similarity wherever both vectors exist and the
/// lexical score everywhere else; `Lexical` never calls the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    Lexical,
    #[default]
    Embedding,
}

impl fmt::Display for RankingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingMode::Lexical => f.write_str("lexical"),
            RankingMode::Embedding => f.write_str("embedding"),
        }
    }
}

impl std::str::FromStr for RankingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lexical" => Ok(RankingMode::Lexical),
            "embedding" | "semantic" => Ok(RankingMode::Embedding),
            other => Err(format!(
                "unknown ranking mode '{}' (expected lexical or embedding)",
                other
            )),
        }
    }
}
