//! Lexical matcher - token overlap scoring with no external calls
//!
//! Three policies are supported because deployed webhooks disagreed on what
//! "matches" means. `Substring` is the default:
//! - `Substring`: fraction of distinct query tokens contained in the document text
//! - `TokenOverlap`: fraction of distinct query tokens equal to a document token
//! - `AnyToken`: 1.0 if any query token equals a document token, else 0.0
//!
//! All scores are in [0, 1].

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How query tokens are matched against document text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LexicalPolicy {
    #[default]
    Substring,
    TokenOverlap,
    AnyToken,
}

impl LexicalPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LexicalPolicy::Substring => "substring",
            LexicalPolicy::TokenOverlap => "token-overlap",
            LexicalPolicy::AnyToken => "any-token",
        }
    }
}

impl fmt::Display for LexicalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LexicalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "substring" => Ok(LexicalPolicy::Substring),
            "token-overlap" | "overlap" => Ok(LexicalPolicy::TokenOverlap),
            "any-token" | "any" => Ok(LexicalPolicy::AnyToken),
            other => Err(format!(
                "unknown lexical policy '{}' (expected substring, token-overlap, any-token)",
                other
            )),
        }
    }
}

/// Lowercase, drop everything that is not alphanumeric or whitespace,
/// collapse runs of whitespace to a single space.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalized text on whitespace, discarding single-character tokens
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .filter(|t| t.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Distinct query tokens in first-seen order
///
/// Order matters only for reproducible debug output; scoring treats this as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    terms: Vec<String>,
}

impl QueryTerms {
    /// Normalize and tokenize raw query text
    pub fn parse(raw: &str) -> Self {
        Self::from_normalized(&normalize(raw))
    }

    pub fn from_normalized(normalized: &str) -> Self {
        let mut seen = HashSet::new();
        let terms = tokenize(normalized)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self { terms }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Score already-normalized document text against query terms
pub fn score(policy: LexicalPolicy, terms: &QueryTerms, document_text: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }

    let found = match policy {
        LexicalPolicy::Substring => terms
            .as_slice()
            .iter()
            .filter(|t| document_text.contains(t.as_str()))
            .count(),
        LexicalPolicy::TokenOverlap | LexicalPolicy::AnyToken => {
            let doc_tokens: HashSet<&str> = document_text
                .split_whitespace()
                .filter(|t| t.chars().count() > 1)
                .collect();
            terms
                .as_slice()
                .iter()
                .filter(|t| doc_tokens.contains(t.as_str()))
                .count()
        }
    };

    match policy {
        LexicalPolicy::AnyToken => {
            if found > 0 {
                1.0
            } else {
                0.0
            }
        }
        _ => found as f32 / terms.len() as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize("  Lipaglyn:  MASLD\tStudy!! "), "lipaglyn masld study");
        assert_eq!(normalize("Doe, J. (2020)."), "doe j 2020");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!..."), "");
    }

    #[test]
    fn test_tokenize_drops_single_characters() {
        assert_eq!(tokenize("a bc d efg"), vec!["bc", "efg"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_query_terms_are_distinct() {
        let terms = QueryTerms::parse("Masld masld, MASLD trial");
        assert_eq!(terms.as_slice(), &["masld".to_string(), "trial".to_string()]);
    }

    #[test]
    fn test_substring_policy_counts_fraction() {
        let terms = QueryTerms::parse("lipaglyn masld results");
        let doc = normalize("Lipaglyn MASLD Study Doe 2020");
        let s = score(LexicalPolicy::Substring, &terms, &doc);
        assert!((s - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_substring_matches_inside_words() {
        let terms = QueryTerms::parse("glyn");
        let doc = normalize("Lipaglyn");
        assert_eq!(score(LexicalPolicy::Substring, &terms, &doc), 1.0);
        assert_eq!(score(LexicalPolicy::TokenOverlap, &terms, &doc), 0.0);
    }

    #[test]
    fn test_any_token_is_boolean() {
        let terms = QueryTerms::parse("diabetes unrelated words");
        let doc = normalize("Diabetes Trial Roe 2019");
        assert_eq!(score(LexicalPolicy::AnyToken, &terms, &doc), 1.0);

        let miss = QueryTerms::parse("nothing here");
        assert_eq!(score(LexicalPolicy::AnyToken, &miss, &doc), 0.0);
    }

    #[test]
    fn test_token_overlap_fraction() {
        let terms = QueryTerms::parse("diabetes trial outcomes results");
        let doc = normalize("Diabetes Trial Roe 2019");
        assert_eq!(score(LexicalPolicy::TokenOverlap, &terms, &doc), 0.5);
    }

    #[test]
    fn test_empty_query_never_matches() {
        let terms = QueryTerms::parse("   ");
        let doc = normalize("Anything at all");
        for policy in [
            LexicalPolicy::Substring,
            LexicalPolicy::TokenOverlap,
            LexicalPolicy::AnyToken,
        ] {
            assert_eq!(score(policy, &terms, &doc), 0.0);
        }
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("substring".parse::<LexicalPolicy>(), Ok(LexicalPolicy::Substring));
        assert_eq!("ANY-TOKEN".parse::<LexicalPolicy>(), Ok(LexicalPolicy::AnyToken));
        assert!("fuzzy".parse::<LexicalPolicy>().is_err());
    }
}
