use crate::bootstrap::init::{
    StaticSearch, cleanup_two_node_network, random_peer_id, setup_two_node_network,
};
use futures::io::Cursor;
use libp2p::request_response::Codec;
use node::modules::expertise::{VECTOR_DIMENSION, Vector};
use node::modules::network::query_protocol::{QueryCodec, QueryProtocol};
use node::modules::query::{
    HttpLocalSearch, LocalSearch, QueryError, QueryRequest, QueryRouter, handler,
};
use serde_json::{Value, json};
use serial_test::serial;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(query_id: &str) -> QueryRequest {
    QueryRequest {
        query_id: query_id.to_string(),
        expertise_key: "".to_string(),
        model: "nomic-embed-text".to_string(),
        match_count: 3,
        vector: Vector::try_from(vec![0.5; VECTOR_DIMENSION]).unwrap(),
    }
}

async fn search_service(status: u16, body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_remote_query_is_answered_by_peer_search() {
    let matches = json!({"matches": [{"key": "doc-7", "score": 0.42}]});
    let service = search_service(200, matches.clone()).await;
    let remote_search: Arc<dyn LocalSearch> =
        Arc::new(HttpLocalSearch::new(&service.uri(), Duration::from_secs(10)).unwrap());

    let local_search = Arc::new(StaticSearch::new(false));
    let ctx = setup_two_node_network(local_search.clone(), remote_search).await;
    let router = QueryRouter::new(ctx.first.clone(), local_search.clone());

    let result = router
        .route(request("q-remote"), &ctx.second.local_peer_id().to_string())
        .await
        .unwrap();

    assert_eq!(result, matches);
    assert_eq!(local_search.calls.load(Ordering::SeqCst), 0);

    let forwarded = service.received_requests().await.unwrap();
    assert_eq!(forwarded.len(), 1);
    let body: Value = serde_json::from_slice(&forwarded[0].body).unwrap();
    assert_eq!(body["queryId"], "q-remote");
    assert_eq!(body["embedding"]["match_count"], 3);
    assert_eq!(body["embedding"]["model"], "nomic-embed-text");
    assert_eq!(
        body["embedding"]["vector"].as_array().unwrap().len(),
        VECTOR_DIMENSION
    );

    cleanup_two_node_network(ctx).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_remote_search_failure_comes_back_as_upstream_error() {
    let service = search_service(500, json!({"error": "index offline"})).await;
    let remote_search: Arc<dyn LocalSearch> =
        Arc::new(HttpLocalSearch::new(&service.uri(), Duration::from_secs(10)).unwrap());

    let local_search = Arc::new(StaticSearch::new(false));
    let ctx = setup_two_node_network(local_search.clone(), remote_search).await;
    let router = QueryRouter::new(ctx.first.clone(), local_search);

    let err = router
        .route(request("q-fail"), &ctx.second.local_peer_id().to_string())
        .await
        .unwrap_err();

    match err {
        QueryError::Upstream(message) => {
            assert!(message.starts_with("Failed to process query"), "got: {}", message)
        }
        other => panic!("expected upstream error, got {:?}", other),
    }

    cleanup_two_node_network(ctx).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_unconnected_peer_and_self_query_over_running_host() {
    let local_search = Arc::new(StaticSearch::new(false));
    let ctx = setup_two_node_network(
        local_search.clone(),
        Arc::new(StaticSearch::new(false)),
    )
    .await;
    let router = QueryRouter::new(ctx.first.clone(), local_search.clone());

    let stranger = random_peer_id();
    let err = router
        .route(request("q-stranger"), &stranger.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::PeerNotConnected(p) if p == stranger));

    let result = router
        .route(request("q-self"), &ctx.first.local_peer_id().to_string())
        .await
        .unwrap();
    assert_eq!(result["queryId"], "q-self");
    assert_eq!(local_search.calls.load(Ordering::SeqCst), 1);

    cleanup_two_node_network(ctx).await;
}

#[tokio::test]
async fn test_truncated_request_gets_decode_failure_response() {
    let mut codec = QueryCodec::default();
    let protocol = QueryProtocol::as_stream_protocol();
    let search = StaticSearch::new(false);

    let mut bytes = request("q-cut").to_bytes().unwrap();
    bytes.truncate(bytes.len() / 3);

    let frame = codec
        .read_request(&protocol, &mut Cursor::new(bytes))
        .await
        .unwrap();
    let response = handler::answer(frame, &search).await;

    let mut wire = Vec::new();
    codec
        .write_response(&protocol, &mut wire, response)
        .await
        .unwrap();

    let on_wire: Value = serde_json::from_slice(&wire).unwrap();
    assert_eq!(
        on_wire,
        json!({"success": false, "error": "Failed to decode request"})
    );
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
}
