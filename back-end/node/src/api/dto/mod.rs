use crate::modules::expertise::{Embedding, Expertise, Vector};
use crate::modules::query::QueryRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt::Display;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Rejection of an HTTP request body. Always a 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid request format: {0}")]
    InvalidFormat(String),

    #[error("Each vector must have exactly 768 values")]
    EmbeddingDimension,

    #[error("Vector must have exactly 768 values")]
    QueryDimension,
}

/// An error response: status code plus JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn internal(error: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": error }),
        }
    }

    pub fn internal_with_details(error: &str, details: impl Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": error, "details": details.to_string() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::InvalidFormat(rejection.body_text()).into()
    }
}

// ============================================================================
// Expertise
// ============================================================================

/// Body of `POST /expertise`.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub embeddings: Vec<EmbeddingInput>,
}

/// Vectors stay raw here so a wrong length gets its own message instead of a
/// generic decode failure.
#[derive(Debug, Deserialize)]
pub struct EmbeddingInput {
    pub key: String,
    pub expertise: String,
    pub model: String,
    pub vector: Vec<f64>,
}

impl IngestRequest {
    /// Required-field checks run over the whole batch before any dimension check.
    pub fn into_expertise(self) -> Result<Expertise, ValidationError> {
        for (i, input) in self.embeddings.iter().enumerate() {
            for (field, value) in [
                ("key", &input.key),
                ("expertise", &input.expertise),
                ("model", &input.model),
            ] {
                if value.is_empty() {
                    return Err(ValidationError::InvalidFormat(format!(
                        "embeddings[{i}].{field} is required"
                    )));
                }
            }
        }

        let embeddings = self
            .embeddings
            .into_iter()
            .map(|input| {
                let vector = Vector::try_from(input.vector)
                    .map_err(|_| ValidationError::EmbeddingDimension)?;
                Ok(Embedding::new(input.key, input.expertise, input.model, vector))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Expertise::new(embeddings))
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: String,
    #[serde(rename = "embeddingCount")]
    pub embedding_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ExpertiseListResponse {
    pub topics: Vec<Expertise>,
}

// ============================================================================
// Query
// ============================================================================

/// Body of `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryBody {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(rename = "queryId")]
    pub query_id: String,
    pub embedding: QueryEmbedding,
}

#[derive(Debug, Deserialize)]
pub struct QueryEmbedding {
    #[serde(default)]
    pub expertise_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub vector: Vec<f64>,
    #[serde(default)]
    pub match_count: u32,
}

impl QueryBody {
    /// Split into the target node id and the wire request.
    pub fn into_request(self) -> Result<(String, QueryRequest), ValidationError> {
        if self.node_id.is_empty() {
            return Err(ValidationError::InvalidFormat("nodeId is required".into()));
        }
        if self.query_id.is_empty() {
            return Err(ValidationError::InvalidFormat("queryId is required".into()));
        }

        let vector =
            Vector::try_from(self.embedding.vector).map_err(|_| ValidationError::QueryDimension)?;

        let request = QueryRequest {
            query_id: self.query_id,
            expertise_key: self.embedding.expertise_key,
            model: self.embedding.model,
            match_count: self.embedding.match_count,
            vector,
        };

        Ok((self.node_id, request))
    }
}
