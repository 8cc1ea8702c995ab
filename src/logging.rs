//! Tracing subscriber setup
//!
//! Logs go to stderr so `rank --json` output on stdout stays clean.
//! Filter precedence: `REFMATCH_LOG`, then `RUST_LOG`, then the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "refmatch=info",
        1 => "refmatch=debug",
        _ => "refmatch=trace",
    }
}

/// Install the global subscriber (idempotent: later calls are ignored)
pub fn init(verbosity: u8) {
    let filter = std::env::var("REFMATCH_LOG")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
