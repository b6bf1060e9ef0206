//! Protocol-level error types shared across crates.

use thiserror::Error;

/// Errors produced while reading, framing, or parsing an MVRP message.
///
/// Every variant is fatal for the connection it occurred on and for nothing
/// else: the server logs it and closes that connection without a response.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The request line did not carry both a method and a target.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// The status line was not `<version> <code> <reason>`.
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),

    /// The start line or header block was not valid UTF-8.
    #[error("message head is not valid UTF-8")]
    NonUtf8Head,

    /// `Content-Length` was present but not a non-negative integer.
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// Fewer body bytes arrived than `Content-Length` declared.
    #[error("incomplete body: expected {expected} bytes, received {received}")]
    IncompleteBody { expected: usize, received: usize },

    /// A request carried body bytes without declaring `Content-Length`.
    #[error("request body of {received} bytes sent without Content-Length")]
    UndeclaredBody { received: usize },

    /// The message would exceed the configured size cap.
    #[error("message too large: {size} bytes exceeds maximum of {max}")]
    MessageTooLarge { size: usize, max: usize },

    /// The peer closed the stream before sending any bytes.
    #[error("connection closed before a message was received")]
    ConnectionClosed,

    /// An I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
