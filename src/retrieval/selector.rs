//! Top-K selection
//!
//! Order of operations:
//! 1. drop matches with no evidence of relevance
//! 2. sort by score descending, ties by corpus position
//! 3. dedup by document link (first = best-ranked survives)
//! 4. truncate to K

use std::cmp::Ordering;
use std::collections::HashSet;

use super::ranker::{ScoreKind, ScoredMatch};

/// Whether a match counts as relevant
///
/// Lexical scores must be above zero. Embedding scores must exceed
/// `min_similarity` (and zero): a negative or zero cosine is no signal.
fn is_relevant(m: &ScoredMatch<'_>, min_similarity: f32) -> bool {
    match m.kind {
        ScoreKind::Lexical => m.score > 0.0,
        ScoreKind::Embedding => m.score > min_similarity.max(0.0),
    }
}

/// Pick the best `k` distinct documents
pub fn select_top_k<'c>(
    matches: Vec<ScoredMatch<'c>>,
    k: usize,
    min_similarity: f32,
) -> Vec<ScoredMatch<'c>> {
    let mut kept: Vec<ScoredMatch<'c>> = matches
        .into_iter()
        .filter(|m| is_relevant(m, min_similarity))
        .collect();

    kept.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.document.id.cmp(&b.document.id))
    });

    let mut seen = HashSet::new();
    kept.retain(|m| seen.insert(m.document.dedup_key()));
    kept.truncate(k);
    kept
}
