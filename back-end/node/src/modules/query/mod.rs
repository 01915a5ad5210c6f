//! Vector queries against one node's expertise, local or over the wire.

mod error;
pub mod handler;
mod local_search;
mod messages;
mod router;

pub use error::{QueryError, SearchError};
pub use local_search::{HttpLocalSearch, LocalSearch};
pub use messages::{MessageError, QueryFrame, QueryRequest, QueryResponse};
pub use router::{PeerHost, QueryRouter};
