use super::helpers::*;
use crate::bootstrap::init::{
    ChannelBehaviour, TestServerOptions, setup_test_server, setup_test_server_with,
};
use axum::http::StatusCode;
use node::modules::gossip;
use serde_json::json;
use serial_test::serial;
use tracing::info;

#[tokio::test]
#[serial]
async fn test_list_expertise_empty() {
    let server = setup_test_server().await;

    let (status, body) = get_request(&server.router, "/expertise").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"topics": []}));
}

#[tokio::test]
#[serial]
async fn test_ingest_stores_and_gossips() {
    let server = setup_test_server().await;
    let payload = json!({"embeddings": [embedding("doc-1"), embedding("doc-2")]});

    let (status, body) = post_json(&server.router, "/expertise", &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Expertise received and gossiped");
    assert_eq!(body["embeddingCount"], 2);

    let sent = server.channel.sent.lock().await;
    assert_eq!(sent.len(), 1, "Exactly one broadcast per ingest");
    let gossiped = gossip::decode(&sent[0]).unwrap();
    assert_eq!(gossiped.keys().collect::<Vec<_>>(), vec!["doc-1", "doc-2"]);

    let (_, listed) = get_request(&server.router, "/expertise").await;
    info!("Listed expertise: {} topics", listed["topics"].as_array().unwrap().len());
    assert_eq!(listed["topics"].as_array().unwrap().len(), 1);
    assert_eq!(listed["topics"][0]["embeddings"][0]["key"], "doc-1");
    assert_eq!(listed["topics"][0]["embeddings"][1]["expertise"], "distributed systems");
}

#[tokio::test]
#[serial]
async fn test_ingest_appends_in_order() {
    let server = setup_test_server().await;

    for key in ["first", "second", "third"] {
        let payload = json!({"embeddings": [embedding(key)]});
        let (status, _) = post_json(&server.router, "/expertise", &payload).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, listed) = get_request(&server.router, "/expertise").await;
    let keys: Vec<_> = listed["topics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|topic| topic["embeddings"][0]["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["first", "second", "third"]);
}

#[tokio::test]
#[serial]
async fn test_ingest_rejects_wrong_dimension() {
    let server = setup_test_server().await;
    let mut short = embedding("doc-2");
    short["vector"] = json!(vector(767));
    let payload = json!({"embeddings": [embedding("doc-1"), short]});

    let (status, body) = post_json(&server.router, "/expertise", &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Each vector must have exactly 768 values"}));
    assert!(server.node.store.is_empty().await, "Nothing stored on rejection");
    assert!(server.channel.sent.lock().await.is_empty());
}

#[tokio::test]
#[serial]
async fn test_ingest_rejects_malformed_json() {
    let server = setup_test_server().await;

    let (status, body) = post_raw(&server.router, "/expertise", "{\"embeddings\": [").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid request format"), "got: {}", error);
}

#[tokio::test]
#[serial]
async fn test_ingest_rejects_missing_field() {
    let server = setup_test_server().await;
    let mut incomplete = embedding("doc-1");
    incomplete.as_object_mut().unwrap().remove("model");

    let (status, body) =
        post_json(&server.router, "/expertise", &json!({"embeddings": [incomplete]})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request format"));
}

#[tokio::test]
#[serial]
async fn test_ingest_rejects_empty_key() {
    let server = setup_test_server().await;
    let payload = json!({"embeddings": [embedding("")]});

    let (status, body) = post_json(&server.router, "/expertise", &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request format"));
    assert!(server.node.store.is_empty().await);
}

#[tokio::test]
#[serial]
async fn test_ingest_without_listeners_still_succeeds() {
    for behaviour in [ChannelBehaviour::NotJoined, ChannelBehaviour::NoPeers] {
        let server = setup_test_server_with(TestServerOptions {
            channel: behaviour,
            ..Default::default()
        })
        .await;

        let payload = json!({"embeddings": [embedding("doc-1")]});
        let (status, body) = post_json(&server.router, "/expertise", &payload).await;

        assert_eq!(status, StatusCode::OK, "{:?} should not fail the ingest", behaviour);
        assert_eq!(body["embeddingCount"], 1);
        assert_eq!(server.node.store.len().await, 1);
    }
}

#[tokio::test]
#[serial]
async fn test_ingest_gossip_failure_keeps_record() {
    let server = setup_test_server_with(TestServerOptions {
        channel: ChannelBehaviour::Reject,
        ..Default::default()
    })
    .await;

    let payload = json!({"embeddings": [embedding("doc-1")]});
    let (status, body) = post_json(&server.router, "/expertise", &payload).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to gossip expertise");
    assert!(body["details"].as_str().unwrap().contains("message too large"));
    assert_eq!(server.node.store.len().await, 1, "Ingest and gossip are not atomic");
}
