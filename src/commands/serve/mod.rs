//! Webhook server
//!
//! Blocking HTTP microserver (no async runtime). The engine is built once
//! at startup and shared read-only by every connection thread.

mod internal;
mod microserver;
mod webhook;

use anyhow::{Context, Result};
use std::net::TcpListener;
use std::sync::Arc;
use tracing::{info, warn};

use refmatch::websearch;
use refmatch::Config;

use internal::ServerState;

/// Start the server and block forever
pub fn execute(config: &Config) -> Result<()> {
    let engine = super::build_engine(config)?;
    let search = websearch::create_search(&config.search);

    let documents = engine.corpus().len();
    if documents == 0 {
        warn!("corpus is empty; every request will get the no-references text");
    }

    let addr = format!("{}:{}", config.serve.host, config.serve.port);
    let listener =
        TcpListener::bind(&addr).with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        %addr,
        documents,
        mode = %engine.options().mode,
        search = search.is_some(),
        "server listening"
    );
    println!("🚀 refmatch listening on http://{}", addr);

    internal::accept_loop(listener, Arc::new(ServerState::new(engine, search)));
    Ok(())
}
