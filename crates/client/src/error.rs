//! Client error types.

use mvrp_common::ProtocolError;
use thiserror::Error;

/// Failure of a single round trip. Each step has its own variant; nothing
/// is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured server name is not a valid DNS name or IP address.
    #[error("invalid server name: {0:?}")]
    InvalidServerName(String),

    /// TCP connect failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// TLS handshake failed, including server certificate rejection.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    /// Writing the request failed.
    #[error("failed to send request: {0}")]
    Write(#[source] std::io::Error),

    /// Reading the response failed or it exceeded the size cap.
    #[error("failed to read response: {0}")]
    Read(#[source] ProtocolError),

    /// The response bytes did not parse.
    #[error("malformed response: {0}")]
    MalformedResponse(#[source] ProtocolError),

    /// A step did not finish within the configured deadline.
    #[error("timed out during {0}")]
    Timeout(&'static str),
}
