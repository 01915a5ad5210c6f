//! Error types for query routing and local search.

use libp2p::PeerId;
use thiserror::Error;

/// Errors raised while answering or routing a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The peer host has no identity yet.
    #[error("P2P host not initialized yet")]
    HostNotReady,

    #[error("invalid peer ID: {0}")]
    InvalidPeerId(String),

    /// The target is known to be valid but there is no live connection to it.
    #[error("not connected to peer {0}")]
    PeerNotConnected(PeerId),

    #[error("failed to open stream to peer: {0}")]
    PeerUnreachable(String),

    #[error("query to peer timed out")]
    Timeout,

    #[error("failed to send query request: {0}")]
    Transport(String),

    #[error("failed to decode query response: {0}")]
    Serialization(String),

    /// The remote peer answered with `success: false`.
    #[error("query failed on peer: {0}")]
    Upstream(String),

    /// The local search collaborator failed while serving a self-query.
    #[error(transparent)]
    LocalSearch(#[from] SearchError),
}

/// Errors from the external vector-search service.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to send query to search API: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search API returned error status: {status}")]
    Status { status: u16 },

    #[error("failed to parse query response: {0}")]
    Decode(#[from] serde_json::Error),
}
