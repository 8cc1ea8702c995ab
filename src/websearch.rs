//! External link lookup for webhook replies
//!
//! Appends "For more details, please visit: <link>" using the first result
//! of a web search for the user's query. Optional and best effort: any
//! failure means "no external link".

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SearchSection;

/// Suffix when a link was found
pub fn external_link_line(link: &str) -> String {
    format!("For more details, please visit: {}", link)
}

/// Suffix when the search produced nothing
pub const NO_EXTERNAL_LINK: &str = "(No external link found.)";

/// Web search returning the single most relevant link
pub trait LinkSearch: Send + Sync {
    fn first_link(&self, query: &str) -> Result<Option<String>>;
}

/// Google Programmable Search (Custom Search JSON API)
pub struct GoogleCustomSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
}

impl GoogleCustomSearch {
    pub fn new(endpoint: &str, api_key: &str, engine_id: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() || engine_id.trim().is_empty() {
            bail!("search API key and engine id are required");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build search HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.trim().to_string(),
            engine_id: engine_id.trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

impl LinkSearch for GoogleCustomSearch {
    fn first_link(&self, query: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
            ])
            .send()
            .context("search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("search API returned {}", status);
        }

        let parsed: SearchResponse = resp.json().context("malformed search response")?;
        Ok(parsed.items.into_iter().next().map(|item| item.link))
    }
}

/// Create the configured link search, if enabled and credentialed
pub fn create_search(config: &SearchSection) -> Option<Arc<dyn LinkSearch>> {
    if !config.enabled {
        return None;
    }

    let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
    let engine_id = std::env::var(&config.engine_id_env).unwrap_or_default();

    match GoogleCustomSearch::new(&config.endpoint, &api_key, &engine_id, config.timeout()) {
        Ok(search) => {
            debug!(endpoint = %config.endpoint, "external link search ready");
            Some(Arc::new(search))
        }
        Err(e) => {
            warn!(
                error = %e,
                key_env = %config.api_key_env,
                engine_env = %config.engine_id_env,
                "external link search disabled"
            );
            None
        }
    }
}

/// Look up a link, treating failures as "no link"
pub fn lookup_link(search: &dyn LinkSearch, query: &str) -> Option<String> {
    match search.first_link(query) {
        Ok(link) => link,
        Err(e) => {
            warn!(error = %e, "external link search failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl LinkSearch for Broken {
        fn first_link(&self, _query: &str) -> Result<Option<String>> {
            bail!("network down")
        }
    }

    #[test]
    fn test_parse_first_item() {
        let body = r#"{"items":[{"link":"https://a.example"},{"link":"https://b.example"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.items[0].link, "https://a.example");
    }

    #[test]
    fn test_parse_no_items() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"kind":"customsearch#search"}"#).unwrap();
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn test_lookup_failure_is_none() {
        assert_eq!(lookup_link(&Broken, "anything"), None);
    }

    #[test]
    fn test_new_requires_credentials() {
        assert!(GoogleCustomSearch::new("https://x", "", "cx", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_disabled_search_is_none() {
        assert!(create_search(&SearchSection::default()).is_none());
    }

    #[test]
    fn test_link_line() {
        assert_eq!(
            external_link_line("https://a.example"),
            "For more details, please visit: https://a.example"
        );
    }
}
