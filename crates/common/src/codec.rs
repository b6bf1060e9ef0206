//! MVRP message codec.
//!
//! ```text
//! <METHOD> <TARGET> MVRP/1.0\r\n          request line
//! MVRP/1.0 <code> <reason>\r\n            status line (responses)
//! <Header-Name>: <Header-Value>\r\n       zero or more, any order
//! \r\n
//! <body bytes>
//! ```
//!
//! Encoding never computes `Content-Length` implicitly: callers set it, for
//! example with [`Request::with_content_length`]. A request without
//! `Content-Length` has an empty body; bytes after its head are rejected with
//! [`ProtocolError::UndeclaredBody`] rather than taken as a body of whatever
//! length happened to arrive. Parsing operates on a buffer
//! that already holds the whole message; see [`crate::framing`] for reading
//! one off a stream.

use bytes::Bytes;

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::{
    content_length, Headers, Status, CONTENT_LENGTH, HEADER_SEPARATOR, LINE_END, VERSION,
};

/// The empty line that ends the header block, including the preceding line's terminator.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// A parsed or to-be-encoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl Request {
    /// A request with no headers and an empty body.
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set `Content-Length` to the current body length.
    pub fn with_content_length(self) -> Self {
        let len = self.body.len();
        self.with_header(CONTENT_LENGTH, len.to_string())
    }

    /// Serialise to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let start = format!("{} {} {VERSION}", self.method, self.target);
        encode_message(&start, &self.headers, &self.body)
    }
}

/// A parsed or to-be-encoded response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    /// A response with no headers and an empty body.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set `Content-Length` to the current body length.
    pub fn with_content_length(self) -> Self {
        let len = self.body.len();
        self.with_header(CONTENT_LENGTH, len.to_string())
    }

    /// Serialise to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let start = format!("{VERSION} {}", self.status);
        encode_message(&start, &self.headers, &self.body)
    }
}

fn encode_message(start_line: &str, headers: &Headers, body: &[u8]) -> Vec<u8> {
    let mut head = String::with_capacity(start_line.len() + 2 + headers.len() * 32);
    head.push_str(start_line);
    head.push_str(LINE_END);
    for (name, value) in headers {
        head.push_str(name);
        head.push_str(HEADER_SEPARATOR);
        head.push_str(value);
        head.push_str(LINE_END);
    }
    head.push_str(LINE_END);

    let mut out = Vec::with_capacity(head.len() + body.len());
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(body);
    out
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Offset of [`HEAD_TERMINATOR`] within `buf`, if present.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}

/// Offset of the first [`LINE_END`] within `buf`, if present.
pub(crate) fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.windows(LINE_END.len())
        .position(|w| w == LINE_END.as_bytes())
}

/// Method and target of a request line. The version token is not checked.
pub(crate) fn request_line_parts(line: &str) -> ProtocolResult<(&str, &str)> {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(method), Some(target)) => Ok((method, target)),
        _ => Err(ProtocolError::MalformedRequestLine(line.to_owned())),
    }
}

/// Parse a complete request buffer.
///
/// # Errors
///
/// - [`ProtocolError::MalformedRequestLine`] if the first line lacks a method or target.
/// - [`ProtocolError::NonUtf8Head`] if the head is not UTF-8.
/// - [`ProtocolError::InvalidContentLength`] / [`ProtocolError::IncompleteBody`]
///   if the declared length is unusable or unsatisfied.
/// - [`ProtocolError::UndeclaredBody`] if body bytes follow a head without
///   `Content-Length`.
pub fn parse_request(buf: &[u8]) -> ProtocolResult<Request> {
    let (start_line, headers, body) = split_message(buf)?;
    let (method, target) = request_line_parts(start_line)?;

    let body = match content_length(&headers)? {
        None if !body.is_empty() => {
            return Err(ProtocolError::UndeclaredBody { received: body.len() })
        }
        _ => frame_body(&headers, body)?,
    };
    Ok(Request {
        method: method.to_owned(),
        target: target.to_owned(),
        headers,
        body,
    })
}

/// Parse a complete response buffer.
///
/// # Errors
///
/// Same as [`parse_request`], with [`ProtocolError::MalformedStatusLine`] in
/// place of the request-line error.
pub fn parse_response(buf: &[u8]) -> ProtocolResult<Response> {
    let (start_line, headers, body) = split_message(buf)?;

    let mut parts = start_line.splitn(3, ' ');
    let _version = parts.next();
    let code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| ProtocolError::MalformedStatusLine(start_line.to_owned()))?;
    let reason = parts.next().unwrap_or_default();

    let body = frame_body(&headers, body)?;
    Ok(Response {
        status: Status::new(code, reason),
        headers,
        body,
    })
}

/// Split a buffer into start line, headers, and raw body bytes.
///
/// Headers run up to the first empty line; everything after it is body, even
/// if it contains the header separator. Header lines without the separator
/// are skipped.
fn split_message(buf: &[u8]) -> ProtocolResult<(&str, Headers, &[u8])> {
    let (head, body) = match find_head_end(buf) {
        Some(end) => (&buf[..end], &buf[end + HEAD_TERMINATOR.len()..]),
        None => (buf, &buf[buf.len()..]),
    };
    let head = std::str::from_utf8(head).map_err(|_| ProtocolError::NonUtf8Head)?;
    let (start_line, headers) = parse_head(head);
    Ok((start_line, headers, body))
}

/// Split a UTF-8 head into its start line and headers.
pub(crate) fn parse_head(head: &str) -> (&str, Headers) {
    let mut lines = head.split(LINE_END);
    let start_line = lines.next().unwrap_or_default();

    let mut headers = Headers::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(HEADER_SEPARATOR) {
            headers.insert(name.to_owned(), value.to_owned());
        }
    }
    (start_line, headers)
}

/// Trim `body` to the declared `Content-Length`, if any.
fn frame_body(headers: &Headers, body: &[u8]) -> ProtocolResult<Bytes> {
    match content_length(headers)? {
        Some(expected) if body.len() < expected => Err(ProtocolError::IncompleteBody {
            expected,
            received: body.len(),
        }),
        Some(expected) => Ok(Bytes::copy_from_slice(&body[..expected])),
        None => Ok(Bytes::copy_from_slice(body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CONTENT_TYPE;

    #[test]
    fn parses_request_with_body() {
        let req =
            parse_request(b"CREATE /widgets MVRP/1.0\r\nContent-Length: 5\r\n\r\nhello").unwrap();
        assert_eq!(req.method, "CREATE");
        assert_eq!(req.target, "/widgets");
        assert_eq!(req.headers.get(CONTENT_LENGTH).map(String::as_str), Some("5"));
        assert_eq!(&req.body[..], b"hello");
    }

    #[test]
    fn parses_request_without_headers() {
        let req = parse_request(b"PATCH /x MVRP/1.0\r\n\r\n").unwrap();
        assert_eq!(req.method, "PATCH");
        assert_eq!(req.target, "/x");
        assert!(req.headers.is_empty());
        assert!(req.body.is_empty());
    }

    #[test]
    fn request_line_without_target_is_malformed() {
        let err = parse_request(b"GET\r\n\r\n").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedRequestLine(l) if l == "GET"));
    }

    #[test]
    fn empty_buffer_is_malformed() {
        assert!(matches!(
            parse_request(b""),
            Err(ProtocolError::MalformedRequestLine(_))
        ));
    }

    #[test]
    fn version_token_is_optional() {
        let req = parse_request(b"READ /thing\r\n\r\n").unwrap();
        assert_eq!(req.method, "READ");
        assert_eq!(req.target, "/thing");
    }

    #[test]
    fn header_lines_without_separator_are_skipped() {
        let req =
            parse_request(b"READ /a MVRP/1.0\r\nnot-a-header\r\nX-Trace: abc\r\n\r\n").unwrap();
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.headers.get("X-Trace").map(String::as_str), Some("abc"));
    }

    #[test]
    fn header_value_may_contain_separator() {
        let req = parse_request(b"READ /a MVRP/1.0\r\nX-Note: a: b\r\n\r\n").unwrap();
        assert_eq!(req.headers.get("X-Note").map(String::as_str), Some("a: b"));
    }

    #[test]
    fn content_after_blank_line_is_body_even_with_separator() {
        let req = parse_request(
            b"EMIT /e MVRP/1.0\r\nContent-Length: 23\r\n\r\nKey: value\r\nMore: stuff",
        )
        .unwrap();
        assert_eq!(req.headers.len(), 1);
        assert_eq!(&req.body[..], b"Key: value\r\nMore: stuff");
    }

    #[test]
    fn body_without_content_length_is_rejected() {
        let err = parse_request(b"EMIT /e MVRP/1.0\r\n\r\npayload").unwrap_err();
        assert!(matches!(err, ProtocolError::UndeclaredBody { received: 7 }));
    }

    #[test]
    fn response_body_without_content_length_is_kept() {
        let resp = parse_response(b"MVRP/1.0 200 OK\r\n\r\nfree text").unwrap();
        assert_eq!(&resp.body[..], b"free text");
    }

    #[test]
    fn request_line_needs_method_and_target() {
        assert_eq!(request_line_parts("READ /a MVRP/1.0").unwrap(), ("READ", "/a"));
        assert!(matches!(
            request_line_parts("GET"),
            Err(ProtocolError::MalformedRequestLine(l)) if l == "GET"
        ));
        assert!(request_line_parts("   ").is_err());
    }

    #[test]
    fn body_is_trimmed_to_content_length() {
        let req = parse_request(b"EMIT /e MVRP/1.0\r\nContent-Length: 3\r\n\r\nabcdef").unwrap();
        assert_eq!(&req.body[..], b"abc");
    }

    #[test]
    fn short_body_is_incomplete() {
        let err = parse_request(b"EMIT /e MVRP/1.0\r\nContent-Length: 10\r\n\r\nabc").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::IncompleteBody { expected: 10, received: 3 }
        ));
    }

    #[test]
    fn non_utf8_head_is_rejected() {
        let err = parse_request(b"READ /\xff MVRP/1.0\r\n\r\n").unwrap_err();
        assert!(matches!(err, ProtocolError::NonUtf8Head));
    }

    #[test]
    fn binary_body_is_preserved() {
        let mut buf = b"CREATE /bin MVRP/1.0\r\nContent-Length: 4\r\n\r\n".to_vec();
        buf.extend_from_slice(&[0x00, 0xff, 0x0d, 0x0a]);
        let req = parse_request(&buf).unwrap();
        assert_eq!(&req.body[..], &[0x00, 0xff, 0x0d, 0x0a]);
    }

    #[test]
    fn encoded_request_parses_back() {
        let req = Request::new("BURN", "/logs/7")
            .with_header("X-Reason", "retention")
            .with_body("bye\r\n\r\nnot: a header")
            .with_content_length();
        let parsed = parse_request(&req.encode()).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn request_encoding_is_exact() {
        let req = Request::new("CREATE", "/widgets")
            .with_body("hello")
            .with_content_length();
        assert_eq!(
            req.encode(),
            b"CREATE /widgets MVRP/1.0\r\nContent-Length: 5\r\n\r\nhello".to_vec()
        );
    }

    #[test]
    fn encoding_does_not_add_content_length() {
        let req = Request::new("READ", "/x").with_body("abc");
        let wire = String::from_utf8(req.encode()).unwrap();
        assert!(!wire.contains(CONTENT_LENGTH));
    }

    #[test]
    fn response_encoding_starts_with_status_line() {
        let resp = Response::new(Status::created())
            .with_header(CONTENT_TYPE, "text/plain")
            .with_body("Resource created\n")
            .with_content_length();
        let wire = String::from_utf8(resp.encode()).unwrap();
        assert!(wire.starts_with("MVRP/1.0 201 Created\r\n"));
        assert!(wire.ends_with("\r\n\r\nResource created\n"));
    }

    #[test]
    fn parses_response() {
        let resp = parse_response(
            b"MVRP/1.0 405 Method Not Allowed\r\nContent-Length: 19\r\n\r\nMethod not allowed\n",
        )
        .unwrap();
        assert_eq!(resp.status, Status::method_not_allowed());
        assert_eq!(&resp.body[..], b"Method not allowed\n");
    }

    #[test]
    fn encoded_response_parses_back() {
        let resp = Response::new(Status::no_content())
            .with_header("Allow", "OPTIONS, CREATE, READ, EMIT, BURN")
            .with_content_length();
        assert_eq!(parse_response(&resp.encode()).unwrap(), resp);
    }

    #[test]
    fn status_line_without_code_is_malformed() {
        assert!(matches!(
            parse_response(b"MVRP/1.0 OK\r\n\r\n"),
            Err(ProtocolError::MalformedStatusLine(_))
        ));
    }

    #[test]
    fn find_head_end_locates_terminator() {
        assert_eq!(find_head_end(b"A B\r\n\r\nbody"), Some(3));
        assert_eq!(find_head_end(b"A B\r\n"), None);
    }

    #[test]
    fn find_line_end_locates_first_line() {
        assert_eq!(find_line_end(b"GET\r\nX: y\r\n"), Some(3));
        assert_eq!(find_line_end(b"GET"), None);
    }
}
