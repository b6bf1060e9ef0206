//! MVRP wire vocabulary: version token, methods, status codes, and headers.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

/// Protocol version token carried in every start line.
pub const VERSION: &str = "MVRP/1.0";

/// Line terminator for the start line and every header line.
pub const LINE_END: &str = "\r\n";

/// Separator between a header name and its value.
pub const HEADER_SEPARATOR: &str = ": ";

/// `Content-Length` header name.
pub const CONTENT_LENGTH: &str = "Content-Length";

/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";

/// `Allow` header name, set on `OPTIONS` responses.
pub const ALLOW: &str = "Allow";

/// Header map.
///
/// Header order is not significant on the wire. A sorted map keeps encoding
/// deterministic, which makes encoded messages directly comparable in tests.
pub type Headers = BTreeMap<String, String>;

/// Look up the declared body length, matching the header name case-insensitively.
///
/// Returns `Ok(None)` when no `Content-Length` header is present.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidContentLength`] if the value is not a
/// non-negative integer.
pub fn content_length(headers: &Headers) -> ProtocolResult<Option<usize>> {
    let Some(raw) = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(CONTENT_LENGTH))
        .map(|(_, value)| value)
    else {
        return Ok(None);
    };
    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| ProtocolError::InvalidContentLength(raw.clone()))
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// The five methods the server recognises.
///
/// Matching is case-sensitive: `read` is not `READ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Options,
    Create,
    Read,
    Emit,
    Burn,
}

impl Method {
    /// Every recognised method, in `Allow` header order.
    pub const ALL: [Method; 5] = [
        Method::Options,
        Method::Create,
        Method::Read,
        Method::Emit,
        Method::Burn,
    ];

    /// Resolve a method token. Unknown tokens yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == token)
    }

    /// The wire token for this method.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Options => "OPTIONS",
            Method::Create => "CREATE",
            Method::Read => "READ",
            Method::Emit => "EMIT",
            Method::Burn => "BURN",
        }
    }

    /// Value of the `Allow` header: every method token, comma separated.
    pub fn allow_header_value() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Numeric status code plus reason phrase, as carried in a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: u16,
    pub reason: String,
}

impl Status {
    /// Construct an arbitrary status.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// `200 OK`
    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    /// `201 Created`
    pub fn created() -> Self {
        Self::new(201, "Created")
    }

    /// `204 No Content`
    pub fn no_content() -> Self {
        Self::new(204, "No Content")
    }

    /// `405 Method Not Allowed`
    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method Not Allowed")
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}
