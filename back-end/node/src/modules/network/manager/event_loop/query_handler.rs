//! Query protocol event handler - inbound answers and outbound results

use super::NetworkEventLoop;
use crate::modules::query::handler;
use crate::modules::query::{QueryError, QueryFrame, QueryResponse};
use libp2p::PeerId;
use libp2p::request_response::{self, OutboundRequestId, ResponseChannel};
use request_response::Event::*;
use request_response::Message::*;
use std::io;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl NetworkEventLoop {
    pub(crate) fn handle_query_event(
        &mut self,
        event: request_response::Event<QueryFrame, QueryResponse>,
    ) {
        match event {
            Message {
                peer,
                message: Request {
                    request, channel, ..
                },
                ..
            } => {
                info!(peer = %peer, "Received query request");
                self.spawn_query_answer(peer, request, channel);
            }

            Message {
                peer,
                message: Response {
                    request_id,
                    response,
                },
                ..
            } => {
                debug!(peer = %peer, request_id = ?request_id, "Received query response");
                self.complete_query(request_id, response.into_result());
            }

            OutboundFailure {
                peer,
                request_id,
                error,
                ..
            } => {
                warn!(
                    peer = %peer,
                    request_id = ?request_id,
                    error = ?error,
                    "Query request failed"
                );
                self.complete_query(request_id, Err(map_outbound_failure(error)));
            }

            InboundFailure {
                peer,
                request_id,
                error,
                ..
            } => {
                warn!(
                    peer = %peer,
                    request_id = ?request_id,
                    error = ?error,
                    "Failed to answer query"
                );
            }

            ResponseSent {
                peer, request_id, ..
            } => {
                debug!(peer = %peer, request_id = ?request_id, "Query response sent");
            }
        }
    }

    /// Forward to local search off the loop; the reply comes back through
    /// `query_reply_tx`
    fn spawn_query_answer(
        &self,
        peer: PeerId,
        frame: QueryFrame,
        channel: ResponseChannel<QueryResponse>,
    ) {
        let search = Arc::clone(&self.local_search);
        let replies = self.query_reply_tx.clone();

        tokio::spawn(async move {
            let response = handler::answer(frame, search.as_ref()).await;
            if replies.send((channel, response)).is_err() {
                debug!(peer = %peer, "Event loop gone before query answer was ready");
            }
        });
    }

    pub(crate) fn send_query_response(
        &mut self,
        channel: ResponseChannel<QueryResponse>,
        response: QueryResponse,
    ) {
        if let Err(response) = self
            .swarm
            .behaviour_mut()
            .query
            .send_response(channel, response)
        {
            // The requester dropped the stream or the connection closed
            error!(success = response.success, "Failed to send query response");
        }
    }

    fn complete_query(
        &mut self,
        request_id: OutboundRequestId,
        result: Result<serde_json::Value, QueryError>,
    ) {
        match self.pending_queries.remove(&request_id) {
            Some(pending) => {
                let _ = pending.send(result);
            }
            None => warn!(request_id = ?request_id, "Result for unknown query request"),
        }
    }
}

fn map_outbound_failure(error: request_response::OutboundFailure) -> QueryError {
    match error {
        request_response::OutboundFailure::DialFailure => {
            QueryError::PeerUnreachable("dial failure".to_string())
        }
        request_response::OutboundFailure::ConnectionClosed => {
            QueryError::PeerUnreachable("connection closed".to_string())
        }
        request_response::OutboundFailure::UnsupportedProtocols => {
            QueryError::PeerUnreachable("peer does not support the query protocol".to_string())
        }
        request_response::OutboundFailure::Timeout => QueryError::Timeout,
        request_response::OutboundFailure::Io(e) if e.kind() == io::ErrorKind::InvalidData => {
            QueryError::Serialization(e.to_string())
        }
        request_response::OutboundFailure::Io(e) => QueryError::Transport(e.to_string()),
    }
}
