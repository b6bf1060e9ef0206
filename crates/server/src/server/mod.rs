//! MVRP server: TLS listener, accept loop, and per-connection handling.
//!
//! # Responsibilities
//! - Build the TLS server configuration from on-disk credentials.
//! - Accept TCP connections and hand each to its own Tokio task.
//! - Per connection: handshake, read one request, dispatch, write one response.

pub mod connection;
pub mod dispatch;
pub mod state;
pub mod tls;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use state::ServerState;

/// Delay before accepting again after an accept error such as `EMFILE`.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A bound listener plus the state every connection shares.
pub struct Server {
    listener: TcpListener,
    state: ServerState,
}

impl Server {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: &str, state: ServerState) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        Ok(Self { listener, state })
    }

    /// The address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Runs until the process is killed.
    ///
    /// Each connection runs on its own task. Accept errors are logged and the
    /// loop resumes after a short pause.
    pub async fn run(self) {
        match self.listener.local_addr() {
            Ok(addr) => info!(addr = %addr, "MVRP server listening"),
            Err(e) => error!(error = %e, "failed to read listener address"),
        }

        loop {
            match self.listener.accept().await {
                Ok((tcp, peer)) => {
                    let conn_id = Uuid::new_v4();
                    debug!(%peer, %conn_id, "accepted TCP connection");
                    let span = info_span!("connection", %conn_id, %peer);
                    let state = self.state.clone();
                    tokio::spawn(connection::handle(state, tcp, peer).instrument(span));
                }
                Err(e) => back_off_after_accept_error(&e).await,
            }
        }
    }
}

async fn back_off_after_accept_error(e: &std::io::Error) {
    error!(error = %e, backoff_ms = ACCEPT_ERROR_BACKOFF.as_millis() as u64, "accept error");
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}
