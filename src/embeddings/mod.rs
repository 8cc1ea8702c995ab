//! Embeddings module - turn text into vectors for cosine ranking
//!
//! The provider is an external collaborator: it may be slow, rate limited or
//! down. Every query-time call goes through `embed_with_timeout`, and every
//! failure is reported as `EmbeddingError` so the ranker can fall back to
//! lexical scoring.

mod openai;
mod similarity;

pub use openai::OpenAiEmbedder;
pub use similarity::cosine_similarity;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::EmbeddingsSection;
use crate::error::EmbeddingError;

/// Trait for embedding providers
///
/// Requires Send + Sync: one provider is shared by all request threads.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Generate embeddings for multiple texts
    ///
    /// Default implementation embeds one text at a time.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Expected vector length, if the provider knows it up front
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Model identifier (vectors from different models are not comparable)
    fn model_name(&self) -> &str;
}

/// Embed text with a hard deadline
///
/// The call runs on a detached worker thread. If the deadline passes, the
/// worker is abandoned and its eventual result is dropped.
pub fn embed_with_timeout(
    provider: Arc<dyn EmbeddingProvider>,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>, EmbeddingError> {
    let (tx, rx) = mpsc::sync_channel(1);
    let text = text.to_string();
    let worker = Arc::clone(&provider);

    std::thread::spawn(move || {
        // Receiver may be gone after a timeout; nothing to report then
        let _ = tx.send(worker.embed(&text));
    });

    let vector = match rx.recv_timeout(timeout) {
        Ok(result) => result?,
        Err(mpsc::RecvTimeoutError::Timeout) => return Err(EmbeddingError::Timeout(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            return Err(EmbeddingError::Malformed(
                "embedding worker exited without a result".to_string(),
            ))
        }
    };

    if let Some(expected) = provider.dimension() {
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                found: vector.len(),
            });
        }
    }
    Ok(vector)
}

/// Create the configured embedding provider
///
/// Returns `Ok(None)` when embeddings are disabled. The API key is read from
/// the environment variable named in the config, never from the file itself.
pub fn create_provider(
    config: &EmbeddingsSection,
) -> Result<Option<Arc<dyn EmbeddingProvider>>, EmbeddingError> {
    if !config.enabled {
        return Ok(None);
    }

    let api_key = std::env::var(&config.api_key_env).map_err(|_| {
        EmbeddingError::Unconfigured(format!("environment variable {} is not set", config.api_key_env))
    })?;

    let embedder = OpenAiEmbedder::new(
        &api_key,
        &config.endpoint,
        &config.model,
        config.dimensions,
        config.timeout(),
    )?;
    debug!(model = %config.model, endpoint = %config.endpoint, "embedding provider ready");

    Ok(Some(Arc::new(embedder)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f32>);

    impl EmbeddingProvider for Fixed {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self.0.clone())
        }

        fn dimension(&self) -> Option<usize> {
            Some(2)
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct Sleepy;

    impl EmbeddingProvider for Sleepy {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(vec![1.0])
        }

        fn model_name(&self) -> &str {
            "sleepy"
        }
    }

    #[test]
    fn test_embed_with_timeout_returns_vector() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(Fixed(vec![0.5, 0.5]));
        let v = embed_with_timeout(provider, "q", Duration::from_secs(2)).unwrap();
        assert_eq!(v, vec![0.5, 0.5]);
    }

    #[test]
    fn test_embed_with_timeout_expires() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(Sleepy);
        let err = embed_with_timeout(provider, "q", Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, EmbeddingError::Timeout(_)));
    }

    #[test]
    fn test_embed_with_timeout_checks_dimension() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(Fixed(vec![1.0, 0.0, 0.0]));
        let err = embed_with_timeout(provider, "q", Duration::from_secs(2)).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_default_batch_embeds_each_text() {
        let provider = Fixed(vec![1.0, 2.0]);
        let batch = provider
            .embed_batch(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_disabled_provider_is_none() {
        let config = EmbeddingsSection::default();
        assert!(create_provider(&config).unwrap().is_none());
    }
}
