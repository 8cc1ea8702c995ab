//! Per-request query: raw text plus everything derived from it

use crate::lexical::{normalize, QueryTerms};

#[derive(Debug, Clone)]
pub struct Query {
    pub raw_text: String,
    pub normalized: String,
    pub terms: QueryTerms,
    /// Present only when the provider answered in time
    pub embedding: Option<Vec<f32>>,
}

impl Query {
    pub fn new(raw_text: &str) -> Self {
        let normalized = normalize(raw_text);
        let terms = QueryTerms::from_normalized(&normalized);
        Self {
            raw_text: raw_text.to_string(),
            normalized,
            terms,
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding).filter(|v| !v.is_empty());
        self
    }

    /// No usable tokens: nothing can match lexically
    pub fn is_blank(&self) -> bool {
        self.terms.is_empty()
    }
}
