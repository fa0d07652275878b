//! Development-time tracing for debugging the harness.
//!
//! Dev diagnostics only, via `RUST_LOG`, output to stderr. Product artifacts
//! (transcripts, error logs, result datasets) are written by `io` and
//! `workflow` regardless of the tracing filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset.
/// Output: stderr, compact format.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
