use super::helpers::*;
use crate::bootstrap::init::setup_test_server;
use axum::http::StatusCode;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_health_check_returns_healthy() {
    let server = setup_test_server().await;

    let (status, body) = get_request(&server.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string(), "timestamp should be a string");
    assert_eq!(body["peerId"], server.local_peer_id.to_string());
    assert_eq!(body["networkRunning"], false);
}

#[tokio::test]
#[serial]
async fn test_unknown_route_is_404() {
    let server = setup_test_server().await;

    let (status, _) = get_request(&server.router, "/api/v1/spaces").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
