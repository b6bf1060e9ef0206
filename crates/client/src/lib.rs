//! MVRP client library: one TLS connection per request, no pooling, no retry.

pub mod config;
pub mod error;
pub mod sender;
pub mod telemetry;
pub mod tls;

pub use error::ClientError;
pub use sender::MvrpClient;
