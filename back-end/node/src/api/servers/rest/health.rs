//! Health check handler.

use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};

use crate::api::servers::app_state::AppState;

/// Liveness plus the node identity and whether the swarm is up.
pub async fn check(State(app_state): State<AppState>) -> Json<Value> {
    let node = app_state.node.read().await;

    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "peerId": node.peer_id(),
        "networkRunning": node.is_network_running().await,
    }))
}
