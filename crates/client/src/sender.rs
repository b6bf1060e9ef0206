//! One request per connection over TLS.
//!
//! For each call the sender:
//! 1. Opens a TCP connection and completes the TLS handshake.
//! 2. Writes the encoded request, `Content-Length` always set.
//! 3. Reads one response (length-delimited, or to EOF) and closes.
//!
//! There is no pooling and no retry.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use bytes::Bytes;
use mvrp_common::{framing, parse_response, Request, Response};
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::config::Config;
use crate::error::ClientError;
use crate::tls::load_client_config;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends MVRP requests to one server.
///
/// Cloning is cheap; clones share the TLS configuration.
#[derive(Clone)]
pub struct MvrpClient {
    addr: String,
    server_name: ServerName<'static>,
    connector: TlsConnector,
    timeout: Duration,
    max_response_bytes: usize,
}

impl MvrpClient {
    /// Create a client for `addr`, verifying the server certificate against `server_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidServerName`] if `server_name` is neither
    /// a DNS name nor an IP address.
    pub fn new(
        addr: impl Into<String>,
        server_name: &str,
        tls: Arc<ClientConfig>,
    ) -> Result<Self, ClientError> {
        let server_name = ServerName::try_from(server_name)
            .map(|name| name.to_owned())
            .map_err(|_| ClientError::InvalidServerName(server_name.to_owned()))?;
        Ok(Self {
            addr: addr.into(),
            server_name,
            connector: TlsConnector::from(tls),
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: framing::DEFAULT_MAX_MESSAGE_SIZE,
        })
    }

    /// Build a client from configuration, loading credentials from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if any credential file is unreadable or malformed.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let tls = load_client_config(
            Path::new(&cfg.tls_cert_path),
            Path::new(&cfg.tls_key_path),
            Path::new(&cfg.tls_ca_path),
        )?;
        let client = Self::new(cfg.server_addr.clone(), &cfg.server_name, tls)
            .context("invalid SERVER_NAME")?
            .with_timeout(cfg.timeout())
            .with_max_response_bytes(cfg.max_response_bytes);
        Ok(client)
    }

    /// Deadline applied to each of connect, handshake, write, and read.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, max: usize) -> Self {
        self.max_response_bytes = max;
        self
    }

    /// Send one request and return the response text as received.
    ///
    /// Invalid UTF-8 in the response is replaced, not rejected.
    pub async fn send_raw(
        &self,
        method: &str,
        target: &str,
        body: impl Into<Bytes>,
    ) -> Result<String, ClientError> {
        let raw = self.round_trip(method, target, body.into()).await?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Send one request and parse the response.
    pub async fn send(
        &self,
        method: &str,
        target: &str,
        body: impl Into<Bytes>,
    ) -> Result<Response, ClientError> {
        let raw = self.round_trip(method, target, body.into()).await?;
        parse_response(&raw).map_err(ClientError::MalformedResponse)
    }

    async fn round_trip(&self, method: &str, target: &str, body: Bytes) -> Result<Bytes, ClientError> {
        let wire = Request::new(method, target)
            .with_body(body)
            .with_content_length()
            .encode();

        let tcp = self
            .deadline("connect", TcpStream::connect(self.addr.as_str()))
            .await?
            .map_err(|source| ClientError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        debug!(addr = %self.addr, "TCP connection established");

        let mut stream = self
            .deadline(
                "handshake",
                self.connector.connect(self.server_name.clone(), tcp),
            )
            .await?
            .map_err(ClientError::Handshake)?;

        self.deadline("write", async {
            stream.write_all(&wire).await?;
            stream.flush().await
        })
        .await?
        .map_err(ClientError::Write)?;

        let raw = self
            .deadline(
                "read",
                framing::read_response(&mut stream, self.max_response_bytes),
            )
            .await?
            .map_err(ClientError::Read)?;
        debug!(method, target, bytes = raw.len(), "response received");

        // The server has already closed its side; a failed close_notify changes nothing.
        let _ = stream.shutdown().await;
        Ok(raw)
    }

    async fn deadline<F: Future>(&self, stage: &'static str, fut: F) -> Result<F::Output, ClientError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ClientError::Timeout(stage))
    }
}
