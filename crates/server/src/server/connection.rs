//! Lifecycle of one accepted connection.
//!
//! ```text
//! Accepted ─► Handshake ─► Reading ─┬─► Parsed ─► Dispatching ─► Responding ─► Closed
//!                                   └─► MalformedRequest ──────────────────────► Closed
//! ```
//!
//! Exactly one request is read and at most one response is written. A
//! malformed or unreadable request closes the connection with no response.
//! The stream is owned here for the whole lifetime and dropped on every path.

use std::net::SocketAddr;

use mvrp_common::{framing, parse_request, ProtocolError, Status};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::dispatch::dispatch;
use super::state::{Limits, ServerState};

/// Why a connection ended without a response being written.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("TLS handshake timed out")]
    HandshakeTimeout,

    #[error("timed out reading request")]
    ReadTimeout,

    /// The request could not be read or did not parse.
    #[error(transparent)]
    Request(#[from] ProtocolError),

    #[error("failed to write response: {0}")]
    Write(#[source] std::io::Error),

    #[error("timed out writing response")]
    WriteTimeout,
}

impl ConnectionError {
    /// True when the peer sent bytes that are not a valid request.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ConnectionError::Request(
                ProtocolError::MalformedRequestLine(_)
                    | ProtocolError::NonUtf8Head
                    | ProtocolError::InvalidContentLength(_)
                    | ProtocolError::IncompleteBody { .. }
                    | ProtocolError::UndeclaredBody { .. }
                    | ProtocolError::MessageTooLarge { .. }
            )
        )
    }
}

/// Drive one accepted TCP connection to completion and log the outcome.
///
/// Never returns an error: failures are logged and stay confined to this
/// connection.
pub async fn handle(state: ServerState, tcp: TcpStream, peer: SocketAddr) {
    match run(&state, tcp).await {
        Ok(status) => debug!(%peer, status = status.code, "connection closed"),
        Err(e) if e.is_malformed() => {
            warn!(%peer, error = %e, "malformed request; closing without response")
        }
        Err(e) => warn!(%peer, error = %e, "connection failed"),
    }
}

async fn run(state: &ServerState, tcp: TcpStream) -> Result<Status, ConnectionError> {
    let limits = state.limits;

    let mut stream = timeout(limits.handshake_timeout, state.acceptor.accept(tcp))
        .await
        .map_err(|_| ConnectionError::HandshakeTimeout)?
        .map_err(ConnectionError::Handshake)?;

    let outcome = serve(&mut stream, &limits).await;

    // Send close_notify on every path past the handshake; the peer sees a
    // clean EOF whether or not a response was written.
    if let Ok(Err(e)) = timeout(limits.write_timeout, stream.shutdown()).await {
        debug!(error = %e, "TLS shutdown failed");
    }

    outcome
}

/// Read one request, dispatch it, and write one response.
///
/// Generic over the stream so the state machine can be driven without TLS.
pub async fn serve<S>(stream: &mut S, limits: &Limits) -> Result<Status, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = timeout(
        limits.read_timeout,
        framing::read_request(stream, limits.max_request_bytes),
    )
    .await
    .map_err(|_| ConnectionError::ReadTimeout)??;

    let request = parse_request(&raw)?;
    debug!(
        method = %request.method,
        target = %request.target,
        body_len = request.body.len(),
        "request parsed"
    );

    let response = dispatch(&request);
    let wire = response.encode();

    timeout(limits.write_timeout, async {
        stream.write_all(&wire).await?;
        stream.flush().await
    })
    .await
    .map_err(|_| ConnectionError::WriteTimeout)?
    .map_err(ConnectionError::Write)?;

    info!(
        method = %request.method,
        target = %request.target,
        status = response.status.code,
        "request served"
    );
    Ok(response.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    async fn round_trip(request: &[u8]) -> (Result<Status, ConnectionError>, Vec<u8>) {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(request).await.unwrap();

        let outcome = serve(&mut server, &Limits::default()).await;
        drop(server);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        (outcome, written)
    }

    #[tokio::test]
    async fn create_is_answered_with_201() {
        let (outcome, written) =
            round_trip(b"CREATE /widgets MVRP/1.0\r\nContent-Length: 5\r\n\r\nhello").await;
        assert_eq!(outcome.unwrap(), Status::created());
        let text = String::from_utf8(written).unwrap();
        assert!(text.starts_with("MVRP/1.0 201 Created\r\n"));
        assert!(text.ends_with("\r\n\r\nResource created\n"));
    }

    #[tokio::test]
    async fn unknown_method_is_answered_with_405() {
        let (outcome, written) = round_trip(b"PATCH /x MVRP/1.0\r\n\r\n").await;
        assert_eq!(outcome.unwrap(), Status::method_not_allowed());
        assert!(written.starts_with(b"MVRP/1.0 405 Method Not Allowed\r\n"));
    }

    #[tokio::test]
    async fn malformed_request_line_writes_nothing() {
        let (outcome, written) = round_trip(b"GET\r\n\r\n").await;
        let err = outcome.unwrap_err();
        assert!(err.is_malformed());
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn bad_request_line_fails_without_waiting_for_head() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(b"GET\r\n").await.unwrap();
        let limits = Limits {
            read_timeout: Duration::from_secs(30),
            ..Limits::default()
        };

        // The peer stays open; the read deadline must not be what ends this.
        let err = tokio::time::timeout(Duration::from_secs(5), serve(&mut server, &limits))
            .await
            .expect("serve waited for the rest of the head")
            .unwrap_err();
        assert!(err.is_malformed(), "{err:?}");
        drop(server);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn body_without_content_length_writes_nothing() {
        let (outcome, written) = round_trip(b"EMIT /e MVRP/1.0\r\n\r\nunframed").await;
        let err = outcome.unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Request(ProtocolError::UndeclaredBody { received: 8 })
        ));
        assert!(err.is_malformed());
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn oversized_request_writes_nothing() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client
            .write_all(b"CREATE /c MVRP/1.0\r\nContent-Length: 999999\r\n\r\n")
            .await
            .unwrap();
        let limits = Limits {
            max_request_bytes: 1024,
            ..Limits::default()
        };

        let err = serve(&mut server, &limits).await.unwrap_err();
        assert!(err.is_malformed());
        drop(server);

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn silent_peer_hits_read_timeout() {
        let (_client, mut server) = tokio::io::duplex(64);
        let limits = Limits {
            read_timeout: Duration::from_millis(20),
            ..Limits::default()
        };
        let err = serve(&mut server, &limits).await.unwrap_err();
        assert!(matches!(err, ConnectionError::ReadTimeout));
        assert!(!err.is_malformed());
    }

    #[tokio::test]
    async fn closed_peer_is_not_malformed() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        let err = serve(&mut server, &Limits::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Request(ProtocolError::ConnectionClosed)
        ));
        assert!(!err.is_malformed());
    }
}
