//! Ranking strategies
//!
//! Each strategy scores every document in the corpus and returns matches in
//! corpus order. Selection (filter, sort, dedup, cap) happens afterwards in
//! `select_top_k`.

use rayon::prelude::*;
use tracing::debug;

use super::query::Query;
use crate::corpus::{Corpus, Document};
use crate::embeddings::cosine_similarity;
use crate::lexical::{self, LexicalPolicy};

/// Scale a score was computed on
///
/// Lexical scores are in [0, 1], embedding scores in [-1, 1]. They are not
/// comparable, so every match carries its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    Lexical,
    Embedding,
}

impl ScoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::Lexical => "lexical",
            ScoreKind::Embedding => "embedding",
        }
    }
}

/// One document with its relevance score
#[derive(Debug, Clone)]
pub struct ScoredMatch<'c> {
    pub document: &'c Document,
    pub score: f32,
    pub kind: ScoreKind,
}

/// Ranking strategy interface
pub trait Ranker: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Score every document, returning matches in corpus order
    fn score_all<'c>(&self, query: &Query, corpus: &'c Corpus) -> Vec<ScoredMatch<'c>>;
}

/// Token overlap scoring, no external calls
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalRanker {
    policy: LexicalPolicy,
}

impl LexicalRanker {
    pub fn new(policy: LexicalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LexicalPolicy {
        self.policy
    }

    fn score_one<'c>(&self, query: &Query, document: &'c Document) -> ScoredMatch<'c> {
        ScoredMatch {
            document,
            score: lexical::score(self.policy, &query.terms, document.search_text()),
            kind: ScoreKind::Lexical,
        }
    }
}

impl Ranker for LexicalRanker {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn score_all<'c>(&self, query: &Query, corpus: &'c Corpus) -> Vec<ScoredMatch<'c>> {
        corpus
            .all()
            .par_iter()
            .map(|doc| self.score_one(query, doc))
            .collect()
    }
}

/// Cosine similarity where both vectors exist, lexical score elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddingRanker {
    fallback: LexicalRanker,
}

impl EmbeddingRanker {
    pub fn new(policy: LexicalPolicy) -> Self {
        Self {
            fallback: LexicalRanker::new(policy),
        }
    }
}

impl Ranker for EmbeddingRanker {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn score_all<'c>(&self, query: &Query, corpus: &'c Corpus) -> Vec<ScoredMatch<'c>> {
        let Some(query_vec) = query.embedding.as_deref() else {
            debug!("query has no embedding; all documents scored lexically");
            return self.fallback.score_all(query, corpus);
        };

        corpus
            .all()
            .par_iter()
            .map(|doc| match doc.embedding.as_deref() {
                Some(doc_vec) if doc_vec.len() == query_vec.len() => ScoredMatch {
                    document: doc,
                    score: cosine_similarity(query_vec, doc_vec),
                    kind: ScoreKind::Embedding,
                },
                _ => self.fallback.score_one(query, doc),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::RawRecord;

    fn corpus_with(embeddings: Vec<Option<Vec<f32>>>) -> Corpus {
        let records = embeddings.into_iter().enumerate().map(|(i, embedding)| RawRecord {
            title: format!("Masld study {}", i),
            citation: format!("Author {}", i),
            link: format!("{}.pdf", i),
            embedding,
            ..Default::default()
        });
        Corpus::load(records).unwrap()
    }

    #[test]
    fn test_lexical_ranker_preserves_corpus_order() {
        let corpus = corpus_with(vec![None, None, None]);
        let matches = LexicalRanker::default().score_all(&Query::new("masld"), &corpus);
        let ids: Vec<usize> = matches.iter().map(|m| m.document.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(matches.iter().all(|m| m.kind == ScoreKind::Lexical));
        assert!(matches.iter().all(|m| m.score == 1.0));
    }

    #[test]
    fn test_embedding_ranker_uses_cosine_when_both_vectors_exist() {
        let corpus = corpus_with(vec![Some(vec![1.0, 0.0]), Some(vec![0.0, 1.0])]);
        let query = Query::new("unrelated words").with_embedding(vec![1.0, 0.0]);
        let matches = EmbeddingRanker::default().score_all(&query, &corpus);

        assert_eq!(matches[0].kind, ScoreKind::Embedding);
        assert!((matches[0].score - 1.0).abs() < 1e-6);
        assert!(matches[1].score.abs() < 1e-6);
    }

    #[test]
    fn test_embedding_ranker_falls_back_per_document() {
        let corpus = corpus_with(vec![Some(vec![1.0, 0.0]), None]);
        let query = Query::new("masld").with_embedding(vec![0.5, 0.5]);
        let matches = EmbeddingRanker::default().score_all(&query, &corpus);

        let kinds: Vec<ScoreKind> = matches.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![ScoreKind::Embedding, ScoreKind::Lexical]);
        assert_eq!(matches[1].score, 1.0);
    }

    #[test]
    fn test_embedding_ranker_dimension_mismatch_falls_back() {
        let corpus = corpus_with(vec![Some(vec![1.0, 0.0]), Some(vec![0.0, 1.0])]);
        let query = Query::new("masld").with_embedding(vec![1.0, 0.0, 0.0]);
        let matches = EmbeddingRanker::default().score_all(&query, &corpus);
        assert!(matches.iter().all(|m| m.kind == ScoreKind::Lexical));
    }

    #[test]
    fn test_embedding_ranker_without_query_vector_equals_lexical() {
        let corpus = corpus_with(vec![Some(vec![1.0, 0.0]), None]);
        let query = Query::new("masld study 1");
        let lexical = LexicalRanker::default().score_all(&query, &corpus);
        let embedding = EmbeddingRanker::default().score_all(&query, &corpus);

        let a: Vec<(usize, f32)> = lexical.iter().map(|m| (m.document.id, m.score)).collect();
        let b: Vec<(usize, f32)> = embedding.iter().map(|m| (m.document.id, m.score)).collect();
        assert_eq!(a, b);
    }
}
