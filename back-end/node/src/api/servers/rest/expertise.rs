//! Expertise ingest and listing handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use tracing::{error, info, warn};

use crate::api::dto::{ApiError, ExpertiseListResponse, IngestRequest, IngestResponse};
use crate::api::servers::app_state::AppState;

/// GET /expertise
pub async fn list(State(app_state): State<AppState>) -> Json<ExpertiseListResponse> {
    let node = app_state.node.read().await;
    Json(ExpertiseListResponse {
        topics: node.expertise().await,
    })
}

/// POST /expertise
///
/// Stores the batch, then gossips it. A broadcast nobody could hear yet is
/// not an error: the periodic sweep picks the record up later.
pub async fn ingest(
    State(app_state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(request) = payload.inspect_err(|e| warn!(error = %e, "Rejected expertise body"))?;
    let expertise = request
        .into_expertise()
        .inspect_err(|e| warn!(error = %e, "Rejected expertise"))?;
    let embedding_count = expertise.len();

    let node = app_state.node.read().await;
    match node.ingest(expertise).await {
        Ok(()) => info!(embedding_count, "Expertise received and gossiped"),
        Err(e) if e.is_unheard() => {
            warn!(error = %e, embedding_count, "Expertise stored, gossip had no listeners")
        }
        Err(e) => {
            error!(error = %e, "Failed to gossip expertise");
            return Err(ApiError::internal_with_details("Failed to gossip expertise", e));
        }
    }

    Ok(Json(IngestResponse {
        message: "Expertise received and gossiped".to_string(),
        embedding_count,
    }))
}
