//! Request routing and connection handling for the webhook server

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use refmatch::websearch::{self, LinkSearch};
use refmatch::ReferenceEngine;

use super::microserver::{self, HttpRequest, HttpResponse};
use super::webhook;

/// Upper bound for a caller-supplied `top_k`
const MAX_TOP_K: usize = 50;

// === Server state ===

/// Shared across request threads; nothing in here is mutated after startup
pub struct ServerState {
    start_time: Instant,
    version: String,
    engine: ReferenceEngine,
    search: Option<Arc<dyn LinkSearch>>,
}

impl ServerState {
    pub fn new(engine: ReferenceEngine, search: Option<Arc<dyn LinkSearch>>) -> Self {
        Self {
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            engine,
            search,
        }
    }

    fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// === API types ===

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
    documents: usize,
}

#[derive(Deserialize)]
struct ReferencesRequest {
    query: String,
    top_k: Option<usize>,
}

// === Helpers ===

fn with_security_headers(response: HttpResponse) -> HttpResponse {
    response
        .with_header("X-Content-Type-Options", "nosniff")
        .with_header("X-Frame-Options", "DENY")
}

fn json_error(status: u16, message: &str) -> HttpResponse {
    HttpResponse::json(status, &serde_json::json!({ "error": message }))
}

// === Handlers ===

/// Route request to handler
pub fn route_request(request: &HttpRequest, state: &ServerState) -> HttpResponse {
    let response = match (request.method.as_str(), request.route()) {
        ("GET", "/") => HttpResponse::text(200, "refmatch is running"),
        ("GET", "/health") => handle_health(state),
        ("POST", "/api/references") => handle_references(request, state),
        ("POST", "/webhook") => handle_webhook(request, state),
        (_, "/" | "/health" | "/api/references" | "/webhook") => {
            json_error(405, "Method not allowed")
        }
        _ => json_error(404, "Not found"),
    };
    with_security_headers(response)
}

fn handle_health(state: &ServerState) -> HttpResponse {
    HttpResponse::json(
        200,
        &HealthResponse {
            status: "ok".to_string(),
            version: state.version.clone(),
            uptime_secs: state.uptime_secs(),
            documents: state.engine.corpus().len(),
        },
    )
}

/// POST /api/references: `{query, top_k?}` → ReferenceSet
fn handle_references(request: &HttpRequest, state: &ServerState) -> HttpResponse {
    if request.body.is_empty() {
        return json_error(400, "Missing request body");
    }
    let body: ReferencesRequest = match serde_json::from_slice(&request.body) {
        Ok(body) => body,
        Err(e) => return json_error(400, &format!("Invalid JSON: {}", e)),
    };

    let k = body
        .top_k
        .unwrap_or(state.engine.options().top_k)
        .min(MAX_TOP_K);
    let result = state.engine.find_references_with_k(&body.query, k);
    debug!(k, returned = result.references.len(), "references served");

    HttpResponse::json(200, &result)
}

/// POST /webhook: Dialogflow CX fulfillment
fn handle_webhook(request: &HttpRequest, state: &ServerState) -> HttpResponse {
    let body: Value = match serde_json::from_slice(&request.body) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "webhook body is not JSON");
            return HttpResponse::text(500, "Webhook error");
        }
    };

    let answer = webhook::answer_text(&body).unwrap_or(webhook::FALLBACK_ANSWER);
    let result = state.engine.find_references(webhook::ranking_text(&body));

    let external = state.search.as_ref().map(|search| {
        let query = webhook::user_query(&body).unwrap_or(answer);
        websearch::lookup_link(search.as_ref(), query)
    });

    let text = webhook::compose_text(
        answer,
        &result.formatted_text,
        external.as_ref().map(|link| link.as_deref()),
    );
    info!(
        references = result.references.len(),
        external_link = matches!(external, Some(Some(_))),
        "webhook fulfilled"
    );

    HttpResponse::json(200, &webhook::fulfillment(&text))
}

// === Transport ===

/// Handle one connection on any Read + Write stream.
///
/// Takes `&mut` so the caller can `shutdown(Write)` the concrete stream after
/// this returns.
pub fn handle_connection(stream: &mut (impl Read + Write), state: &ServerState) {
    let req = match microserver::read_request(stream) {
        Some(Ok(req)) => req,
        Some(Err(msg)) => {
            debug!(error = %msg, "malformed request");
            let status = if msg.contains("too large") { 413 } else { 400 };
            microserver::write_response(stream, &with_security_headers(json_error(status, &msg)));
            return;
        }
        None => return,
    };

    let started = Instant::now();
    let resp = route_request(&req, state);
    debug!(
        method = %req.method,
        path = %req.route(),
        status = resp.status,
        user_agent = req.header("User-Agent").unwrap_or("-"),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    microserver::write_response(stream, &resp);
}

/// Accept loop: one thread per connection, one request per connection
pub fn accept_loop(listener: TcpListener, state: Arc<ServerState>) {
    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    handle_connection(&mut stream, &state);
                    let _ = stream.shutdown(Shutdown::Write);
                });
            }
            Err(e) => error!(error = %e, "accept failed"),
        }
    }
}
