//! Query routing handler.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use serde_json::Value;
use tracing::{error, warn};

use crate::api::dto::{ApiError, QueryBody};
use crate::api::servers::app_state::AppState;
use crate::modules::query::QueryError;

/// POST /query
pub async fn route(
    State(app_state): State<AppState>,
    payload: Result<Json<QueryBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload.inspect_err(|e| warn!(error = %e, "Rejected query body"))?;
    let (target, request) = body
        .into_request()
        .inspect_err(|e| warn!(error = %e, "Rejected query"))?;

    let node = app_state.node.read().await;
    node.query(request, &target).await.map(Json).map_err(|e| {
        error!(node_id = %target, error = %e, "Query failed");
        match e {
            QueryError::HostNotReady => ApiError::internal("P2P host not initialized yet"),
            QueryError::LocalSearch(_) => ApiError::internal_with_details("Failed to query self", e),
            _ => ApiError::internal_with_details("Failed to query peer", e),
        }
    })
}
