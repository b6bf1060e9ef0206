//! State shared by the accept loop and every connection task.

use std::sync::Arc;
use std::time::Duration;

use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

/// Per-connection size cap and deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of one request, head and body together.
    pub max_request_bytes: usize,
    /// Deadline for the TLS handshake.
    pub handshake_timeout: Duration,
    /// Deadline for reading the full request.
    pub read_timeout: Duration,
    /// Deadline for writing the response and closing the stream.
    pub write_timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_request_bytes: mvrp_common::framing::DEFAULT_MAX_MESSAGE_SIZE,
            handshake_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
        }
    }
}

/// Server state handed to each connection task.
///
/// Cheap to clone: the acceptor wraps an `Arc<ServerConfig>` that is never
/// mutated after startup, so connections share it without locking.
#[derive(Clone)]
pub struct ServerState {
    pub acceptor: TlsAcceptor,
    pub limits: Limits,
}

impl ServerState {
    pub fn new(tls: Arc<ServerConfig>, limits: Limits) -> Self {
        Self {
            acceptor: TlsAcceptor::from(tls),
            limits,
        }
    }
}
