//! Telemetry initialisation for the `mvrp` client binary.
//!
//! Structured JSON logs only, written to stderr so that stdout carries
//! nothing but the response. The default level is `warn`; at `debug` the
//! sender also logs the TCP connect and the size of each response received.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the tracing subscriber for the client binary.
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise mvrp tracing subscriber: {e}"))
}
