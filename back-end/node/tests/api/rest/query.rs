use super::helpers::*;
use crate::bootstrap::init::{
    TestServerOptions, random_peer_id, setup_test_server, setup_test_server_with,
};
use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;
use std::sync::atomic::Ordering;

#[tokio::test]
#[serial]
async fn test_self_query_uses_local_search() {
    let server = setup_test_server().await;
    let payload = query_body(&server.local_peer_id.to_string(), 768);

    let (status, body) = post_json(&server.router, "/query", &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"queryId": "q-42", "matches": [{"key": "doc-1", "score": 0.9}]})
    );
    assert_eq!(server.search.calls.load(Ordering::SeqCst), 1);
    assert_eq!(server.host.sends.load(Ordering::SeqCst), 0, "No stream for self-query");
}

#[tokio::test]
#[serial]
async fn test_query_connected_peer() {
    let peer = random_peer_id();
    let server = setup_test_server_with(TestServerOptions {
        connected_peers: vec![peer],
        ..Default::default()
    })
    .await;

    let (status, body) = post_json(&server.router, "/query", &query_body(&peer.to_string(), 768)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answeredBy"], peer.to_string());
    assert_eq!(body["queryId"], "q-42");
    assert_eq!(server.search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn test_query_unconnected_peer_fails_without_stream() {
    let server = setup_test_server().await;
    let peer = random_peer_id();

    let (status, body) = post_json(&server.router, "/query", &query_body(&peer.to_string(), 768)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to query peer");
    assert!(body["details"].as_str().unwrap().contains("not connected"));
    assert_eq!(server.host.sends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn test_query_invalid_peer_id() {
    let server = setup_test_server().await;

    let (status, body) = post_json(&server.router, "/query", &query_body("not-a-peer-id", 768)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to query peer");
}

#[tokio::test]
#[serial]
async fn test_query_rejects_wrong_vector_length() {
    let server = setup_test_server().await;
    let payload = query_body(&server.local_peer_id.to_string(), 10);

    let (status, body) = post_json(&server.router, "/query", &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Vector must have exactly 768 values"}));
    assert_eq!(server.search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn test_query_rejects_missing_node_id() {
    let server = setup_test_server().await;
    let mut payload = query_body("ignored", 768);
    payload.as_object_mut().unwrap().remove("nodeId");

    let (status, body) = post_json(&server.router, "/query", &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request format"));
}

#[tokio::test]
#[serial]
async fn test_query_before_host_ready() {
    let server = setup_test_server_with(TestServerOptions {
        host_not_ready: true,
        ..Default::default()
    })
    .await;

    let (status, body) = post_json(&server.router, "/query", &query_body(&random_peer_id().to_string(), 768)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "P2P host not initialized yet"}));
}

#[tokio::test]
#[serial]
async fn test_self_query_search_failure() {
    let server = setup_test_server_with(TestServerOptions {
        search_fails: true,
        ..Default::default()
    })
    .await;
    let payload = query_body(&server.local_peer_id.to_string(), 768);

    let (status, body) = post_json(&server.router, "/query", &payload).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to query self");
    assert_eq!(body["details"], "search API returned error status: 502");
}
