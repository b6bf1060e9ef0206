//! MVRP server library: configuration, TLS setup, dispatch, and the
//! connection lifecycle. The `mvrp-server` binary wires these together.

pub mod config;
pub mod server;
pub mod telemetry;

pub use server::state::{Limits, ServerState};
pub use server::Server;
