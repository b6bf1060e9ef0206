//! Wire vocabulary, message codec, framing, and credential loading shared by
//! the MVRP server and client.

pub mod codec;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod tls;

pub use codec::{parse_request, parse_response, Request, Response};
pub use error::{ProtocolError, ProtocolResult};
pub use protocol::{Headers, Method, Status};
