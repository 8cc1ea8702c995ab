//! ReferenceEngine - query text in, ranked references out

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::query::Query;
use super::ranker::{EmbeddingRanker, LexicalRanker, Ranker, ScoredMatch};
use super::selector::select_top_k;
use super::RankingMode;
use crate::config::{Config, DEFAULT_TIMEOUT_SECS, DEFAULT_TOP_K};
use crate::corpus::Corpus;
use crate::embeddings::{embed_with_timeout, EmbeddingProvider};
use crate::lexical::LexicalPolicy;
use crate::references::{self, ReferenceSet};

/// Engine tuning, usually taken from `[ranking]` and `[corpus]` config
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub top_k: usize,
    pub mode: RankingMode,
    pub lexical_policy: LexicalPolicy,
    /// Embedding matches at or below this cosine are dropped
    pub min_similarity: f32,
    /// Base location for relative document links
    pub base_url: String,
    /// Deadline for the query embedding call
    pub embed_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            mode: RankingMode::default(),
            lexical_policy: LexicalPolicy::default(),
            min_similarity: 0.0,
            base_url: String::new(),
            embed_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.ranking.top_k,
            mode: config.ranking.mode,
            lexical_policy: config.ranking.lexical_policy,
            min_similarity: config.ranking.min_similarity,
            base_url: config.corpus.base_url.clone(),
            embed_timeout: config.embeddings.timeout(),
        }
    }
}

/// Ranks the shared corpus against caller-supplied text
///
/// Holds no per-request state; one engine serves all request threads.
pub struct ReferenceEngine {
    corpus: Arc<Corpus>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    options: EngineOptions,
}

impl ReferenceEngine {
    pub fn new(corpus: Arc<Corpus>, options: EngineOptions) -> Self {
        Self {
            corpus,
            provider: None,
            options,
        }
    }

    /// Attach an embedding provider (used only in `Embedding` mode)
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Build the query, embedding it when that can help
    ///
    /// The provider is skipped for blank queries, in lexical mode, and when
    /// no document has a vector to compare against. Provider failures only
    /// cost the embedding, never the request.
    pub fn prepare_query(&self, raw_text: &str) -> Query {
        let query = Query::new(raw_text);

        if query.is_blank() || self.options.mode == RankingMode::Lexical {
            return query;
        }
        let Some(provider) = self.provider.as_ref() else {
            return query;
        };
        if self.corpus.embedded_count() == 0 {
            debug!("corpus has no embeddings; skipping query embedding");
            return query;
        }

        match embed_with_timeout(Arc::clone(provider), raw_text, self.options.embed_timeout) {
            Ok(vector) => query.with_embedding(vector),
            Err(e) => {
                warn!(error = %e, model = provider.model_name(), "embedding unavailable, using lexical scores");
                query
            }
        }
    }

    fn ranker(&self) -> Box<dyn Ranker> {
        match self.options.mode {
            RankingMode::Lexical => Box::new(LexicalRanker::new(self.options.lexical_policy)),
            RankingMode::Embedding => Box::new(EmbeddingRanker::new(self.options.lexical_policy)),
        }
    }

    /// Ranked, deduplicated top-`k` matches for a prepared query
    pub fn rank(&self, query: &Query, k: usize) -> Vec<ScoredMatch<'_>> {
        let ranker = self.ranker();
        let scored = ranker.score_all(query, &self.corpus);
        let selected = select_top_k(scored, k, self.options.min_similarity);

        debug!(
            ranker = ranker.name(),
            policy = %self.options.lexical_policy,
            embedded_query = query.embedding.is_some(),
            selected = selected.len(),
            "ranked corpus"
        );
        selected
    }

    /// Full pipeline with the configured K
    pub fn find_references(&self, raw_text: &str) -> ReferenceSet {
        self.find_references_with_k(raw_text, self.options.top_k)
    }

    /// Full pipeline with an explicit K
    pub fn find_references_with_k(&self, raw_text: &str, k: usize) -> ReferenceSet {
        let query = self.prepare_query(raw_text);
        let selected = self.rank(&query, k);
        references::render(&selected, &self.options.base_url)
    }
}
