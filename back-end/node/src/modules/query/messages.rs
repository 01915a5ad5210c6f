//! Messages exchanged over the query protocol.
//!
//! Both sides are plain JSON objects:
//!
//! ```text
//! request:  {"queryId", "expertiseKey", "model", "matchCount", "vector"}
//! response: {"success": true, "result": <any>} | {"success": false, "error": "..."}
//! ```

use super::error::QueryError;
use crate::modules::expertise::Vector;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors encoding or decoding a query protocol message.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response reported failure without an error message")]
    MissingError,
}

/// A nearest-match query against one node's expertise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Opaque correlation id chosen by the caller.
    pub query_id: String,

    /// Restrict matches to one expertise key; empty means all.
    #[serde(default)]
    pub expertise_key: String,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub match_count: u32,

    pub vector: Vector,
}

impl QueryRequest {
    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// An inbound request as read off a stream.
///
/// Undecodable input still gets an answer, so the codec hands it up instead
/// of failing the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFrame {
    Request(QueryRequest),
    Undecodable { reason: String },
}

/// Reply to a [`QueryRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl QueryResponse {
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            error: None,
            result: Some(result),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            result: None,
        }
    }

    /// Collapse into the caller-facing result.
    ///
    /// A success without a payload yields `null`.
    pub fn into_result(self) -> Result<Value, QueryError> {
        if self.success {
            return Ok(self.result.unwrap_or(Value::Null));
        }

        let message = self
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| MessageError::MissingError.to_string());
        Err(QueryError::Upstream(message))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
