use super::error::SearchError;
use super::messages::QueryRequest;
use crate::modules::expertise::Vector;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// The vector-similarity search service answering queries for this node.
#[async_trait]
pub trait LocalSearch: Send + Sync {
    async fn search(&self, request: &QueryRequest) -> Result<Value, SearchError>;
}

#[derive(Serialize)]
struct SearchBody<'a> {
    #[serde(rename = "queryId")]
    query_id: &'a str,
    embedding: SearchEmbedding<'a>,
}

#[derive(Serialize)]
struct SearchEmbedding<'a> {
    expertise_key: &'a str,
    model: &'a str,
    vector: &'a Vector,
    match_count: u32,
}

impl<'a> From<&'a QueryRequest> for SearchBody<'a> {
    fn from(request: &'a QueryRequest) -> Self {
        Self {
            query_id: &request.query_id,
            embedding: SearchEmbedding {
                expertise_key: &request.expertise_key,
                model: &request.model,
                vector: &request.vector,
                match_count: request.match_count,
            },
        }
    }
}

/// Forwards queries to `POST <base_url>/query`.
#[derive(Debug, Clone)]
pub struct HttpLocalSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLocalSearch {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/query", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LocalSearch for HttpLocalSearch {
    async fn search(&self, request: &QueryRequest) -> Result<Value, SearchError> {
        debug!(query_id = %request.query_id, endpoint = %self.endpoint, "Forwarding query to local search");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SearchBody::from(request))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
