//! Corpus sources - CSV reference sheets and JSON document lists
//!
//! CSV sheets use the columns `Folder Name, Sn., Paper, APA, Link`.
//! JSON sources are arrays of `RawRecord` and may carry precomputed embeddings.

use std::path::Path;

use tracing::{info, warn};

use super::{Corpus, RawRecord};
use crate::error::CorpusLoadError;

/// Load a corpus from a file, choosing the parser by extension
pub fn load_path(path: &Path) -> Result<Corpus, CorpusLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| CorpusLoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let records = match extension.as_deref() {
        Some("csv") => parse_csv(path, &content)?,
        Some("json") => parse_json(path, &content)?,
        _ => {
            return Err(CorpusLoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let corpus = Corpus::load(records)?;
    info!(
        path = %path.display(),
        documents = corpus.len(),
        embedded = corpus.embedded_count(),
        "corpus loaded"
    );
    Ok(corpus)
}

/// Find a column by any of its accepted names (case-insensitive, trimmed)
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().to_ascii_lowercase();
        names.iter().any(|n| h == *n)
    })
}

/// Parse a reference sheet
///
/// `Paper` and `APA` are required columns. `Folder Name`, `Sn.` and `Link`
/// default to empty values when the column is absent.
pub fn parse_csv(path: &Path, content: &str) -> Result<Vec<RawRecord>, CorpusLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CorpusLoadError::Malformed {
            path: path.to_path_buf(),
            record: 0,
            message: e.to_string(),
        })?
        .clone();

    let title_col = find_column(&headers, &["paper", "title"]).ok_or_else(|| {
        CorpusLoadError::MissingColumn {
            path: path.to_path_buf(),
            column: "Paper",
        }
    })?;
    let citation_col = find_column(&headers, &["apa", "citation"]).ok_or_else(|| {
        CorpusLoadError::MissingColumn {
            path: path.to_path_buf(),
            column: "APA",
        }
    })?;
    let link_col = find_column(&headers, &["link"]);
    let folder_col = find_column(&headers, &["folder name", "folder"]);
    let serial_col = find_column(&headers, &["sn.", "sn", "serial"]);

    if link_col.is_none() {
        warn!(path = %path.display(), "corpus has no Link column; references will have no link");
    }

    let field = |row: &csv::StringRecord, col: Option<usize>| -> String {
        col.and_then(|c| row.get(c)).unwrap_or("").to_string()
    };

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| CorpusLoadError::Malformed {
            path: path.to_path_buf(),
            record: index + 1,
            message: e.to_string(),
        })?;

        let serial = field(&row, serial_col);
        records.push(RawRecord {
            title: field(&row, Some(title_col)),
            citation: field(&row, Some(citation_col)),
            link: field(&row, link_col),
            folder: field(&row, folder_col),
            serial: if serial.is_empty() { None } else { Some(serial) },
            embedding: None,
        });
    }

    Ok(records)
}

/// Parse a JSON array of records
pub fn parse_json(path: &Path, content: &str) -> Result<Vec<RawRecord>, CorpusLoadError> {
    serde_json::from_str(content).map_err(|e| CorpusLoadError::Malformed {
        path: path.to_path_buf(),
        record: 0,
        message: format!("line {}: {}", e.line(), e),
    })
}
