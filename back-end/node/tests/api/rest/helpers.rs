use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use node::modules::expertise::VECTOR_DIMENSION;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

pub async fn get_request(router: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

pub async fn post_json(router: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    post_raw(router, path, &body.to_string()).await
}

pub async fn post_raw(router: &Router, path: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub fn vector(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64 / len as f64).collect()
}

pub fn embedding(key: &str) -> Value {
    json!({
        "key": key,
        "expertise": "distributed systems",
        "model": "nomic-embed-text",
        "vector": vector(VECTOR_DIMENSION),
    })
}

pub fn query_body(node_id: &str, vector_len: usize) -> Value {
    json!({
        "nodeId": node_id,
        "queryId": "q-42",
        "embedding": {
            "expertise_key": "",
            "model": "nomic-embed-text",
            "vector": vector(vector_len),
            "match_count": 3,
        }
    })
}
