//! Length-delimited reading of one MVRP message from a byte stream.
//!
//! A message is read in two phases:
//!
//! 1. Read until the head terminator (`\r\n\r\n`) is buffered. For a
//!    request, the start line is checked as soon as its line ending arrives,
//!    so a bad request line fails without waiting for the rest of the head.
//! 2. Read until the body declared by `Content-Length` is buffered.
//!
//! Both phases stop with [`ProtocolError::MessageTooLarge`] as soon as the
//! message would exceed the caller's size cap. Surplus bytes beyond the
//! declared body are dropped.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::{
    find_head_end, find_line_end, parse_head, request_line_parts, HEAD_TERMINATOR,
};
use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::content_length;

/// Default cap on a single message, head and body together (1 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// No `Content-Length` means an empty body.
    Request,
    /// No `Content-Length` means the body runs until the peer closes.
    Response,
}

/// Read one request off `reader`.
///
/// A request without `Content-Length` has an empty body. Nothing past its
/// head is read, and bytes already buffered past the head are an error.
///
/// If the peer closes mid-head, the partial bytes are returned as-is and
/// the parser decides whether they form a request.
///
/// # Errors
///
/// - [`ProtocolError::ConnectionClosed`] if the stream ends before any byte.
/// - [`ProtocolError::MalformedRequestLine`] / [`ProtocolError::NonUtf8Head`]
///   as soon as a complete first line lacks a method or target.
/// - [`ProtocolError::IncompleteBody`] if it ends short of `Content-Length`.
/// - [`ProtocolError::UndeclaredBody`] if body bytes arrive with a head that
///   has no `Content-Length`.
/// - [`ProtocolError::MessageTooLarge`] if the message exceeds `max_size`.
/// - [`ProtocolError::Io`] on read failure.
pub async fn read_request<R>(reader: &mut R, max_size: usize) -> ProtocolResult<Bytes>
where
    R: AsyncRead + Unpin,
{
    read_message(reader, max_size, Kind::Request).await
}

/// Read one response off `reader`.
///
/// A response without `Content-Length` is read until EOF, since the server
/// closes the connection after its single response.
///
/// # Errors
///
/// Same as [`read_request`], minus the request-line and undeclared-body checks.
pub async fn read_response<R>(reader: &mut R, max_size: usize) -> ProtocolResult<Bytes>
where
    R: AsyncRead + Unpin,
{
    read_message(reader, max_size, Kind::Response).await
}

async fn read_message<R>(reader: &mut R, max_size: usize, kind: Kind) -> ProtocolResult<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK.min(max_size));
    let mut start_line_checked = kind == Kind::Response;

    // Phase 1: head.
    let head_end = loop {
        if !start_line_checked {
            if let Some(line_end) = find_line_end(&buf) {
                check_request_line(&buf[..line_end])?;
                start_line_checked = true;
            }
        }
        if let Some(end) = find_head_end(&buf) {
            break end;
        }
        ensure_within(buf.len(), max_size)?;
        if fill(reader, &mut buf).await? == 0 {
            if buf.is_empty() {
                return Err(ProtocolError::ConnectionClosed);
            }
            return Ok(buf.freeze());
        }
    };

    let head = std::str::from_utf8(&buf[..head_end]).map_err(|_| ProtocolError::NonUtf8Head)?;
    let (_, headers) = parse_head(head);
    let body_start = head_end + HEAD_TERMINATOR.len();

    // Phase 2: body.
    match (content_length(&headers)?, kind) {
        (Some(declared), _) => {
            let total = body_start.saturating_add(declared);
            ensure_within(total, max_size)?;
            while buf.len() < total {
                if fill(reader, &mut buf).await? == 0 {
                    return Err(ProtocolError::IncompleteBody {
                        expected: declared,
                        received: buf.len() - body_start,
                    });
                }
            }
            buf.truncate(total);
        }
        (None, Kind::Request) => {
            if buf.len() > body_start {
                return Err(ProtocolError::UndeclaredBody {
                    received: buf.len() - body_start,
                });
            }
        }
        (None, Kind::Response) => loop {
            ensure_within(buf.len(), max_size)?;
            if fill(reader, &mut buf).await? == 0 {
                break;
            }
        },
    }

    Ok(buf.freeze())
}

fn check_request_line(line: &[u8]) -> ProtocolResult<()> {
    let line = std::str::from_utf8(line).map_err(|_| ProtocolError::NonUtf8Head)?;
    request_line_parts(line).map(|_| ())
}

/// Read one chunk into `buf`, returning the number of bytes read (0 on EOF).
async fn fill<R>(reader: &mut R, buf: &mut BytesMut) -> ProtocolResult<usize>
where
    R: AsyncRead + Unpin,
{
    buf.reserve(READ_CHUNK);
    Ok(reader.read_buf(buf).await?)
}

fn ensure_within(size: usize, max: usize) -> ProtocolResult<()> {
    if size > max {
        return Err(ProtocolError::MessageTooLarge { size, max });
    }
    Ok(())
}
