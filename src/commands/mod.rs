pub mod corpus;
pub mod rank;
pub mod serve;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use refmatch::corpus::{self as corpus_source, Corpus};
use refmatch::embeddings::{self, EmbeddingProvider};
use refmatch::{Config, EngineOptions, RankingMode, ReferenceEngine};

/// Apply a `--corpus` flag over the configured corpus path
pub fn set_corpus(config: &mut Config, corpus: Option<PathBuf>) {
    if let Some(path) = corpus {
        config.corpus.path = Some(path.to_string_lossy().into_owned());
    }
}

/// Load the configured corpus (fatal if missing or unreadable)
pub fn load_corpus(config: &Config) -> Result<Corpus> {
    let path = config.corpus_path().context(
        "No corpus configured. Pass --corpus, set REFMATCH_CORPUS, or set [corpus] path in config",
    )?;
    corpus_source::load_path(&path)
        .with_context(|| format!("Failed to load corpus {}", path.display()))
}

/// Create the embedding provider, logging (not failing) when unavailable
pub fn provider(config: &Config) -> Option<Arc<dyn EmbeddingProvider>> {
    match embeddings::create_provider(&config.embeddings) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(error = %e, "embedding provider unavailable, ranking lexically");
            None
        }
    }
}

/// Bootstrap the engine: corpus, provider, document embeddings
///
/// Missing document vectors are computed once here, before any request.
pub fn build_engine(config: &Config) -> Result<ReferenceEngine> {
    let mut corpus = load_corpus(config)?;
    let provider = provider(config);

    if let Some(ref p) = provider {
        if config.ranking.mode == RankingMode::Embedding && corpus.embedded_count() < corpus.len()
        {
            match corpus.with_embeddings(p.as_ref()) {
                Ok(embedded) => {
                    info!(documents = embedded.len(), model = p.model_name(), "corpus embedded");
                    corpus = embedded;
                }
                Err(e) => warn!(error = %e, "corpus embedding failed, documents keep lexical scoring"),
            }
        }
    }

    let engine = ReferenceEngine::new(Arc::new(corpus), EngineOptions::from_config(config));
    Ok(match provider {
        Some(p) => engine.with_provider(p),
        None => engine,
    })
}
