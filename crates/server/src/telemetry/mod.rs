//! Telemetry setup: structured JSON logs, plus optional OTLP span export.
//!
//! Every accepted connection runs inside a `connection` span carrying a
//! random `conn_id` and the peer address, so the handshake, the parsed
//! request line and the outcome of one exchange share those fields.
//!
//! | Event | Level |
//! |---|---|
//! | listener bound, request served (method, target, status) | `info` |
//! | malformed request, handshake or deadline failure | `warn` |
//! | accept error (followed by a short backoff) | `error` |
//! | TCP accept, parsed request, close | `debug` |
//!
//! # Telemetry invariants
//!
//! - Request and response **bodies** never appear in any span attribute or log
//!   field; only their length is recorded.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden
//!   by `RUST_LOG` when set.

pub mod init;

pub use init::init_telemetry;
