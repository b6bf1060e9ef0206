//! `mvrp`: send one MVRP request and print the raw response.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Config`] from environment variables.
//! 3. Initialise structured JSON logging on stderr.
//! 4. Load TLS credentials, send the request, print the response.

use anyhow::Result;
use clap::Parser;

use mvrp_client::config::Config;
use mvrp_client::MvrpClient;

#[derive(Parser)]
#[command(name = "mvrp")]
#[command(about = "Send one MVRP request over TLS and print the response", long_about = None)]
struct Cli {
    /// Request method, e.g. OPTIONS, CREATE, READ, EMIT, BURN
    method: String,

    /// Request target, e.g. /widgets/42
    target: String,

    /// Request body
    #[arg(default_value = "")]
    body: String,

    /// Server address, overriding SERVER_ADDR
    #[arg(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Command line
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let mut cfg = Config::from_env().map_err(|e| {
        eprintln!("ERROR: mvrp configuration invalid: {e:#}");
        e
    })?;
    if let Some(addr) = cli.addr {
        cfg.server_addr = addr;
    }

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    mvrp_client::telemetry::init(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 4. Round trip
    // -----------------------------------------------------------------------
    let client = MvrpClient::from_config(&cfg)?;
    let response = client.send_raw(&cli.method, &cli.target, cli.body).await?;
    print!("{response}");

    Ok(())
}
