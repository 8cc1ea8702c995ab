//! Dialogflow CX webhook payloads
//!
//! Incoming requests carry the knowledge-base answer in `knowledge.answers[0]`
//! and the user's words in `queryResult.queryText`. The reply wraps one text
//! message in `fulfillment_response`.

use serde_json::{json, Value};

use refmatch::websearch::{external_link_line, NO_EXTERNAL_LINK};

/// Answer used when the request carries no knowledge-base answer
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't find an answer in our knowledge base.";

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Knowledge-base answer, if present
pub fn answer_text(body: &Value) -> Option<&str> {
    non_empty(body.pointer("/knowledge/answers/0"))
}

/// The user's own words
pub fn user_query(body: &Value) -> Option<&str> {
    non_empty(body.pointer("/queryResult/queryText"))
        .or_else(|| non_empty(body.get("text")))
        .or_else(|| non_empty(body.get("transcript")))
}

/// Text to rank the corpus against: the answer first, then the user's query
pub fn ranking_text(body: &Value) -> &str {
    answer_text(body)
        .or_else(|| non_empty(body.get("text")))
        .or_else(|| non_empty(body.pointer("/queryResult/queryText")))
        .or_else(|| non_empty(body.get("transcript")))
        .unwrap_or("")
}

/// Compose the reply text
///
/// `external` is `None` when link search is disabled and `Some(None)` when it
/// ran but found nothing.
pub fn compose_text(answer: &str, references: &str, external: Option<Option<&str>>) -> String {
    let mut text = format!("{}\n\n{}", answer, references);
    match external {
        Some(Some(link)) => {
            text.push_str("\n\n");
            text.push_str(&external_link_line(link));
        }
        Some(None) => {
            text.push_str("\n\n");
            text.push_str(NO_EXTERNAL_LINK);
        }
        None => {}
    }
    text
}

/// Wrap text in the Dialogflow CX fulfillment envelope
pub fn fulfillment(text: &str) -> Value {
    json!({
        "fulfillment_response": {
            "messages": [
                { "text": { "text": [text] } }
            ]
        }
    })
}
