//! Point-to-point query protocol: one JSON request, one JSON response per stream.

mod codec;
mod config;
mod framing;

pub use codec::{DEFAULT_MAX_MESSAGE_SIZE, QueryCodec, QueryProtocol};
pub use config::QueryProtocolConfig;
pub use framing::{Frame, read_json_value};
