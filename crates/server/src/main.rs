//! `mvrp-server`: binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise telemetry (JSON logs, optional OTLP spans).
//! 3. Load TLS credentials; any failure aborts before the listener binds.
//! 4. Bind the listener and run the accept loop until the process is killed.

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use mvrp_server::config::Config;
use mvrp_server::server::tls;
use mvrp_server::{Server, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    mvrp_server::telemetry::init_telemetry(
        cfg.otel_exporter_otlp_endpoint.as_deref(),
        &cfg.log_level,
    )?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_addr = %cfg.listen_addr,
        "mvrp-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. TLS
    // -----------------------------------------------------------------------
    let tls_config = tls::load_server_config(
        Path::new(&cfg.tls_cert_path),
        Path::new(&cfg.tls_key_path),
        cfg.tls_client_ca_path.as_deref().map(Path::new),
    )?;
    if cfg.tls_client_ca_path.is_none() {
        warn!("TLS_CLIENT_CA_PATH unset; client certificates are not verified");
    }

    // -----------------------------------------------------------------------
    // 4. Accept loop
    // -----------------------------------------------------------------------
    let state = ServerState::new(tls_config, cfg.limits());
    let server = Server::bind(&cfg.listen_addr, state).await?;
    server.run().await;

    Ok(())
}
