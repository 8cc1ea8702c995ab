//! Document corpus - the fixed set of candidate references
//!
//! Built once at startup from raw records, immutable afterwards. The only
//! way to change the corpus is to load a new one (or derive an embedded
//! copy with `with_embeddings` before serving).

pub mod source;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::embeddings::EmbeddingProvider;
use crate::error::{CorpusLoadError, EmbeddingError};
use crate::lexical::normalize;

pub use source::load_path;

/// Raw record as delivered by a corpus source
///
/// Every field is optional at this level; `Corpus::load` decides what is
/// required. Aliases cover the column names used by the tabular sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "paper", deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(
        default,
        alias = "citationText",
        alias = "apa",
        deserialize_with = "null_as_empty"
    )]
    pub citation: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub link: String,
    #[serde(default, alias = "folderName", deserialize_with = "null_as_empty")]
    pub folder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Exported sheets write `null` for blank cells
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A reference document
#[derive(Debug, Clone)]
pub struct Document {
    /// Position in the corpus (assigned in source order, used for tie-breaks)
    pub id: usize,
    pub folder: String,
    pub title: String,
    pub citation: String,
    /// File name or absolute URL; empty when the source had none
    pub link: String,
    /// Source serial number ("Sn." column), kept for display only
    pub serial: Option<String>,
    pub embedding: Option<Vec<f32>>,
    /// Normalized "title citation", precomputed for lexical matching
    search_text: String,
}

impl Document {
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Identity used for deduplication
    ///
    /// Absolute URLs stand alone; file names are scoped by folder, so the
    /// same file name in two folders stays two documents. No link means the
    /// document is only a duplicate of itself.
    pub fn dedup_key(&self) -> String {
        if self.link.is_empty() {
            format!("#{}", self.id)
        } else if crate::references::looks_like_url(&self.link) || self.folder.is_empty() {
            self.link.clone()
        } else {
            format!("{}/{}", self.folder, self.link)
        }
    }

    /// Text sent to the embedding provider for this document
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.citation)
    }
}

/// Immutable in-memory document collection
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    excluded: usize,
    dimension: Option<usize>,
}

impl Corpus {
    /// Build a corpus from raw records
    ///
    /// Fields are trimmed. Records whose title or citation normalize to
    /// nothing are excluded; missing folder/link become empty strings.
    /// Fails only when document embeddings disagree on dimension.
    pub fn load(records: impl IntoIterator<Item = RawRecord>) -> Result<Self, CorpusLoadError> {
        let mut documents = Vec::new();
        let mut excluded = 0;
        let mut dimension: Option<usize> = None;

        for (index, record) in records.into_iter().enumerate() {
            let title = record.title.trim().to_string();
            let citation = record.citation.trim().to_string();
            let title_norm = normalize(&title);
            let citation_norm = normalize(&citation);

            if title_norm.is_empty() || citation_norm.is_empty() {
                debug!(record = index + 1, "excluding record without title or citation");
                excluded += 1;
                continue;
            }

            let embedding = record.embedding.filter(|v| !v.is_empty());
            if let Some(ref vector) = embedding {
                match dimension {
                    None => dimension = Some(vector.len()),
                    Some(expected) if expected != vector.len() => {
                        return Err(CorpusLoadError::DimensionMismatch {
                            expected,
                            found: vector.len(),
                            record: index + 1,
                        });
                    }
                    Some(_) => {}
                }
            }

            documents.push(Document {
                id: documents.len(),
                folder: record.folder.trim().to_string(),
                link: record.link.trim().to_string(),
                serial: record
                    .serial
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                search_text: format!("{} {}", title_norm, citation_norm),
                title,
                citation,
                embedding,
            });
        }

        if excluded > 0 {
            warn!(
                excluded,
                kept = documents.len(),
                "corpus records excluded (missing title or citation)"
            );
        }

        Ok(Self {
            documents,
            excluded,
            dimension,
        })
    }

    /// All documents, in insertion order
    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of source records that were excluded at load time
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Dimension shared by all document embeddings (None if none are embedded)
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of documents carrying an embedding
    pub fn embedded_count(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| d.embedding.is_some())
            .count()
    }

    /// Derive a corpus where every document has an embedding
    ///
    /// Documents that already carry a vector keep it. Fails if the provider
    /// fails or returns vectors of a different dimension than the corpus.
    pub fn with_embeddings(&self, provider: &dyn EmbeddingProvider) -> Result<Self, EmbeddingError> {
        let missing: Vec<usize> = self
            .documents
            .iter()
            .filter(|d| d.embedding.is_none())
            .map(|d| d.id)
            .collect();

        if missing.is_empty() {
            return Ok(self.clone());
        }

        let texts: Vec<String> = missing
            .iter()
            .map(|&id| self.documents[id].embedding_text())
            .collect();
        let vectors = provider.embed_batch(&texts)?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Malformed(format!(
                "{} embeddings returned for {} documents",
                vectors.len(),
                texts.len()
            )));
        }

        let mut dimension = self.dimension;
        let mut documents = self.documents.clone();
        for (id, vector) in missing.into_iter().zip(vectors) {
            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    found: vector.len(),
                });
            }
            documents[id].embedding = Some(vector);
        }

        debug!(
            documents = documents.len(),
            model = provider.model_name(),
            "corpus embedded"
        );

        Ok(Self {
            documents,
            excluded: self.excluded,
            dimension,
        })
    }

    /// Export documents as records (e.g. to cache precomputed embeddings)
    pub fn to_records(&self) -> Vec<RawRecord> {
        self.documents
            .iter()
            .map(|d| RawRecord {
                title: d.title.clone(),
                citation: d.citation.clone(),
                link: d.link.clone(),
                folder: d.folder.clone(),
                serial: d.serial.clone(),
                embedding: d.embedding.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, citation: &str, link: &str) -> RawRecord {
        RawRecord {
            title: title.to_string(),
            citation: citation.to_string(),
            link: link.to_string(),
            folder: "ADD".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_trims_and_assigns_ids_in_order() {
        let corpus = Corpus::load(vec![
            record("  Lipaglyn MASLD Study ", " Doe 2020", " a.pdf "),
            record("Diabetes Trial", "Roe 2019", "b.pdf"),
        ])
        .unwrap();

        assert_eq!(corpus.len(), 2);
        let first = &corpus.all()[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.title, "Lipaglyn MASLD Study");
        assert_eq!(first.citation, "Doe 2020");
        assert_eq!(first.link, "a.pdf");
        assert_eq!(first.search_text(), "lipaglyn masld study doe 2020");
        assert_eq!(corpus.all()[1].id, 1);
    }

    #[test]
    fn test_load_excludes_records_without_title_or_citation() {
        let corpus = Corpus::load(vec![
            record("", "Doe 2020", "a.pdf"),
            record("Title only", "  ...  ", "b.pdf"),
            record("Kept", "Roe 2019", "c.pdf"),
        ])
        .unwrap();

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.excluded(), 2);
        assert_eq!(corpus.all()[0].id, 0);
        assert_eq!(corpus.all()[0].link, "c.pdf");
    }

    #[test]
    fn test_load_keeps_records_missing_link_and_folder() {
        let corpus = Corpus::load(vec![RawRecord {
            title: "Orphan".to_string(),
            citation: "Nobody 2001".to_string(),
            ..Default::default()
        }])
        .unwrap();

        let doc = &corpus.all()[0];
        assert_eq!(doc.link, "");
        assert_eq!(doc.folder, "");
        assert_eq!(doc.dedup_key(), "#0");
    }

    #[test]
    fn test_dedup_key_is_scoped_by_folder() {
        let mut other_folder = record("Same File", "Roe 2019", "a.pdf");
        other_folder.folder = "NASH".to_string();
        let mut absolute = record("Hosted", "Poe 2018", "https://x.example/a.pdf");
        absolute.folder = "NASH".to_string();
        let corpus = Corpus::load(vec![
            record("Same File", "Doe 2020", "a.pdf"),
            other_folder,
            absolute,
        ])
        .unwrap();

        let keys: Vec<String> = corpus.all().iter().map(Document::dedup_key).collect();
        assert_eq!(keys, ["ADD/a.pdf", "NASH/a.pdf", "https://x.example/a.pdf"]);
    }

    #[test]
    fn test_null_fields_deserialize_as_empty() {
        let records: Vec<RawRecord> = serde_json::from_str(
            r#"[{"title": "Liver Fat", "citation": "Doe 2020", "link": null, "folder": null}]"#,
        )
        .unwrap();
        assert_eq!(records[0].link, "");
        assert_eq!(records[0].folder, "");
    }

    #[test]
    fn test_load_rejects_mixed_dimensions() {
        let mut a = record("A", "A 2000", "a.pdf");
        a.embedding = Some(vec![1.0, 0.0]);
        let mut b = record("B", "B 2000", "b.pdf");
        b.embedding = Some(vec![1.0, 0.0, 0.0]);

        let err = Corpus::load(vec![a, b]).unwrap_err();
        assert!(matches!(
            err,
            CorpusLoadError::DimensionMismatch {
                expected: 2,
                found: 3,
                record: 2
            }
        ));
    }

    #[test]
    fn test_empty_embedding_is_absent() {
        let mut a = record("A", "A 2000", "a.pdf");
        a.embedding = Some(vec![]);
        let corpus = Corpus::load(vec![a]).unwrap();
        assert!(corpus.all()[0].embedding.is_none());
        assert_eq!(corpus.dimension(), None);
    }

    #[test]
    fn test_to_records_preserves_fields() {
        let corpus = Corpus::load(vec![record("A", "A 2000", "a.pdf")]).unwrap();
        let records = corpus.to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "A");
        assert_eq!(records[0].folder, "ADD");
    }
}
