//! `request_response::Codec` for the expertise query protocol.
//!
//! # Framing
//!
//! One JSON value per direction, no length prefix. See [`super::framing`].

use super::framing::{Frame, read_json_value};
use crate::modules::query::{QueryFrame, QueryRequest, QueryResponse};
use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite, AsyncWriteExt};
use libp2p::StreamProtocol;
use libp2p::request_response::Codec;
use std::io;
use tracing::{debug, trace, warn};

/// Protocol identifier of the query exchange.
#[derive(Debug, Clone, Default)]
pub struct QueryProtocol;

impl QueryProtocol {
    pub const PROTOCOL_NAME: &'static str = "/p2p-rag/query/0.0.1";

    pub fn as_stream_protocol() -> StreamProtocol {
        StreamProtocol::new(Self::PROTOCOL_NAME)
    }
}

/// Default bound on a single query message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct QueryCodec {
    max_message_size: usize,
}

impl Default for QueryCodec {
    fn default() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }
}

impl QueryCodec {
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    async fn write_message<T>(&self, io: &mut T, payload: &[u8], context: &str) -> io::Result<()>
    where
        T: AsyncWrite + Unpin + Send,
    {
        if payload.len() > self.max_message_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Message too large: {} bytes (max: {})",
                    payload.len(),
                    self.max_message_size
                ),
            ));
        }

        io.write_all(payload).await.map_err(|e| {
            warn!(context = context, error = %e, "Failed to write payload");
            e
        })?;
        io.flush().await.map_err(|e| {
            warn!(context = context, error = %e, "Failed to flush stream");
            e
        })?;

        trace!(context = context, bytes = payload.len(), "Wrote query message");
        Ok(())
    }
}

fn invalid_data(e: impl ToString) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

#[async_trait]
impl Codec for QueryCodec {
    type Protocol = StreamProtocol;
    type Request = QueryFrame;
    type Response = QueryResponse;

    /// Decoding problems, including a stream closed before any request byte,
    /// are returned as [`QueryFrame::Undecodable`] so the server can still answer.
    async fn read_request<T>(&mut self, _protocol: &StreamProtocol, io: &mut T) -> io::Result<QueryFrame>
    where
        T: AsyncRead + Unpin + Send,
    {
        let frame = match read_json_value(io, self.max_message_size).await {
            Ok(Frame::Complete(bytes)) => match QueryRequest::from_bytes(&bytes) {
                Ok(request) => QueryFrame::Request(request),
                Err(e) => QueryFrame::Undecodable {
                    reason: e.to_string(),
                },
            },
            Ok(Frame::Malformed { reason }) => QueryFrame::Undecodable { reason },
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => QueryFrame::Undecodable {
                reason: e.to_string(),
            },
            Err(e) => return Err(e),
        };

        if let QueryFrame::Undecodable { reason } = &frame {
            debug!(reason = %reason, "Inbound query could not be decoded");
        }
        Ok(frame)
    }

    async fn read_response<T>(
        &mut self,
        _protocol: &StreamProtocol,
        io: &mut T,
    ) -> io::Result<QueryResponse>
    where
        T: AsyncRead + Unpin + Send,
    {
        match read_json_value(io, self.max_message_size).await? {
            Frame::Complete(bytes) => QueryResponse::from_bytes(&bytes).map_err(|e| {
                warn!(error = %e, "Failed to deserialize query response");
                invalid_data(e)
            }),
            Frame::Malformed { reason } => {
                warn!(reason = %reason, "Malformed query response");
                Err(invalid_data(reason))
            }
        }
    }

    async fn write_request<T>(
        &mut self,
        _protocol: &StreamProtocol,
        io: &mut T,
        req: QueryFrame,
    ) -> io::Result<()>
    where
        T: AsyncWrite + Unpin + Send,
    {
        let request = match req {
            QueryFrame::Request(request) => request,
            QueryFrame::Undecodable { .. } => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "an undecodable frame cannot be sent",
                ));
            }
        };

        debug!(query_id = %request.query_id, "Writing query request");
        let payload = request.to_bytes().map_err(invalid_data)?;
        self.write_message(io, &payload, "write_request").await
    }

    async fn write_response<T>(
        &mut self,
        _protocol: &StreamProtocol,
        io: &mut T,
        res: QueryResponse,
    ) -> io::Result<()>
    where
        T: AsyncWrite + Unpin + Send,
    {
        debug!(success = res.success, "Writing query response");
        let payload = res.to_bytes().map_err(invalid_data)?;
        self.write_message(io, &payload, "write_response").await
    }
}
