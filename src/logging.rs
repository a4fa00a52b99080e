//! Structured logging setup
//!
//! Logs go to stderr; stdout carries response payloads only. `RUST_LOG`
//! overrides the default `info` level.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "hashbox=info,hashbox_core=info";

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
}
