use super::error::QueryError;
use super::local_search::LocalSearch;
use super::messages::QueryRequest;
use async_trait::async_trait;
use libp2p::PeerId;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// The peer-to-peer substrate as seen by the router.
#[async_trait]
pub trait PeerHost: Send + Sync {
    /// `None` until the host is running.
    async fn local_peer_id(&self) -> Option<PeerId>;

    async fn is_connected(&self, peer: &PeerId) -> Result<bool, QueryError>;

    /// Run the client side of the query protocol against `peer`.
    async fn send_query(&self, peer: PeerId, request: QueryRequest) -> Result<Value, QueryError>;
}

/// Decides whether a query is served locally or sent to a remote peer.
#[derive(Clone)]
pub struct QueryRouter {
    host: Arc<dyn PeerHost>,
    search: Arc<dyn LocalSearch>,
}

impl QueryRouter {
    pub fn new(host: Arc<dyn PeerHost>, search: Arc<dyn LocalSearch>) -> Self {
        Self { host, search }
    }

    /// Route `request` to the node named by `target`.
    ///
    /// A self-query goes straight to local search. Remote peers must already
    /// be connected; no dial is attempted.
    pub async fn route(&self, request: QueryRequest, target: &str) -> Result<Value, QueryError> {
        let local = self.host.local_peer_id().await.ok_or(QueryError::HostNotReady)?;

        if target == local.to_string() {
            info!(query_id = %request.query_id, "Querying self");
            return Ok(self.search.search(&request).await?);
        }

        let peer: PeerId = target
            .parse()
            .map_err(|e| QueryError::InvalidPeerId(format!("{target}: {e}")))?;

        if !self.host.is_connected(&peer).await? {
            return Err(QueryError::PeerNotConnected(peer));
        }

        info!(query_id = %request.query_id, peer = %peer, "Querying peer");
        self.host.send_query(peer, request).await
    }
}
