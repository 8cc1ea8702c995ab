//! Reference formatting
//!
//! Turns selected matches into the output contract:
//! `{ references: [{ rank, link, citation }], formattedText }`.
//!
//! Text layout:
//!
//! ```text
//! Reference
//! 1.[https://host/folder/a.pdf] - Doe 2020
//!
//! 2.[https://host/folder/b.pdf] - Roe 2019
//! ```

use serde::Serialize;

use crate::retrieval::ScoredMatch;

/// Header line of a non-empty reference block
pub const HEADER: &str = "Reference\n";

/// Text returned when nothing in the corpus is relevant
pub const NO_REFERENCES: &str = "No relevant references found.";

/// Placeholder for documents whose source had no link
pub const NO_LINK: &str = "no link available";

/// Schemes treated as already-absolute links
const URL_SCHEMES: &[&str] = &["http://", "https://", "gs://", "s3://", "ftp://"];

/// One rendered reference
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// 1-based position in the result
    pub rank: usize,
    pub link: String,
    pub citation: String,
    pub score: f32,
    pub score_kind: &'static str,
}

/// Rendered result handed to the response layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSet {
    pub references: Vec<Reference>,
    pub formatted_text: String,
}

impl ReferenceSet {
    /// The defined "no relevant references" result
    pub fn empty() -> Self {
        Self {
            references: Vec::new(),
            formatted_text: NO_REFERENCES.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Does the link already carry a recognized scheme?
pub fn looks_like_url(link: &str) -> bool {
    let lower = link.trim_start().to_ascii_lowercase();
    URL_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Build the absolute link for a file in the configured storage location
///
/// `base/folder/encoded-file`. Empty base or folder segments are skipped,
/// and only the file name is percent-encoded.
pub fn resolve_link(base: &str, folder: &str, file_name: &str) -> String {
    if looks_like_url(file_name) {
        return file_name.to_string();
    }

    let encoded = urlencoding::encode(file_name);
    let mut parts: Vec<&str> = Vec::with_capacity(3);

    let base = base.trim().trim_end_matches('/');
    if !base.is_empty() {
        parts.push(base);
    }
    let folder = folder.trim().trim_matches('/');
    if !folder.is_empty() {
        parts.push(folder);
    }
    parts.push(&encoded);

    parts.join("/")
}

/// Render selected matches
///
/// Matches must already be ranked; positions become 1-based ranks.
pub fn render(matches: &[ScoredMatch<'_>], base_url: &str) -> ReferenceSet {
    if matches.is_empty() {
        return ReferenceSet::empty();
    }

    let references: Vec<Reference> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let doc = m.document;
            let link = if doc.link.is_empty() {
                NO_LINK.to_string()
            } else {
                resolve_link(base_url, &doc.folder, &doc.link)
            };
            Reference {
                rank: i + 1,
                link,
                citation: doc.citation.clone(),
                score: m.score,
                score_kind: m.kind.as_str(),
            }
        })
        .collect();

    let lines: Vec<String> = references
        .iter()
        .map(|r| format!("{}.[{}] - {}", r.rank, r.link, r.citation))
        .collect();

    ReferenceSet {
        formatted_text: format!("{}{}", HEADER, lines.join("\n\n")),
        references,
    }
}
