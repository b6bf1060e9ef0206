//! Method dispatch: maps a parsed request to its canned response.
//!
//! | Method    | Status                 | Body                 |
//! |-----------|------------------------|----------------------|
//! | `OPTIONS` | 204 No Content         | empty, plus `Allow`  |
//! | `CREATE`  | 201 Created            | `Resource created\n` |
//! | `READ`    | 200 OK                 | `Resource read\n`    |
//! | `EMIT`    | 200 OK                 | `Event emitted\n`    |
//! | `BURN`    | 200 OK                 | `Resource burned\n`  |
//! | other     | 405 Method Not Allowed | `Method not allowed\n` |
//!
//! No resource state sits behind any of these; target, headers, and body do
//! not influence the outcome.

use bytes::Bytes;
use mvrp_common::protocol::{ALLOW, CONTENT_TYPE};
use mvrp_common::{Method, Request, Response, Status};

/// `Content-Type` of every response body.
pub const TEXT_PLAIN: &str = "text/plain";

pub const CREATED_BODY: &str = "Resource created\n";
pub const READ_BODY: &str = "Resource read\n";
pub const EMITTED_BODY: &str = "Event emitted\n";
pub const BURNED_BODY: &str = "Resource burned\n";
pub const NOT_ALLOWED_BODY: &str = "Method not allowed\n";

/// Produce the response for `request`. Never fails: unknown methods yield 405.
pub fn dispatch(request: &Request) -> Response {
    let method = Method::from_token(&request.method);

    let (status, body) = match method {
        Some(Method::Options) => (Status::no_content(), ""),
        Some(Method::Create) => (Status::created(), CREATED_BODY),
        Some(Method::Read) => (Status::ok(), READ_BODY),
        Some(Method::Emit) => (Status::ok(), EMITTED_BODY),
        Some(Method::Burn) => (Status::ok(), BURNED_BODY),
        None => (Status::method_not_allowed(), NOT_ALLOWED_BODY),
    };

    let response = Response::new(status)
        .with_header(CONTENT_TYPE, TEXT_PLAIN)
        .with_body(Bytes::from_static(body.as_bytes()))
        .with_content_length();

    if method == Some(Method::Options) {
        response.with_header(ALLOW, Method::allow_header_value())
    } else {
        response
    }
}
