use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use allocator_api::create_app;
use allocator_core::models::AssignmentRequest;
use allocator_testing_utils::{MockDedupIndex, MockWorkQueue};

fn app(queue: &MockWorkQueue, index: &MockDedupIndex) -> Router {
    create_app(Arc::new(queue.clone()), Arc::new(index.clone()))
}

fn webhook(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_webhook_enqueues_request() {
    let queue = MockWorkQueue::new();
    let index = MockDedupIndex::new();

    let body = json!({
        "room_id": "r1",
        "candidate_agent": {"id": 42, "name": "Alice"}
    });
    let response = app(&queue, &index)
        .oneshot(webhook(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["room_id"], "r1");
    assert_eq!(json["data"]["candidate_id"], 42);

    assert_eq!(queue.pushed(), vec![AssignmentRequest::new("r1", 42)]);
    let raw: Value = serde_json::from_str(&queue.pending()[0]).unwrap();
    assert_eq!(raw, json!({"room_id": "r1", "candidate_id": 42, "retry_count": 0}));
    assert!(index.has("r1"));
}

#[tokio::test]
async fn test_duplicate_room_enqueued_once() {
    let queue = MockWorkQueue::new();
    let index = MockDedupIndex::new();
    let app = app(&queue, &index);
    let body = json!({"room_id": "r1", "candidate_agent": {"id": 42, "name": "Alice"}}).to_string();

    let first = app.clone().oneshot(webhook(body.clone())).await.unwrap();
    let second = app.oneshot(webhook(body)).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["error"]["message"], "RoomID already exist");
    assert_eq!(queue.push_count(), 1);
}

#[tokio::test]
async fn test_missing_candidate_defaults_to_zero() {
    let queue = MockWorkQueue::new();
    let index = MockDedupIndex::new();

    let response = app(&queue, &index)
        .oneshot(webhook(json!({"room_id": "r2"}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(queue.pushed()[0].candidate_agent_id, 0);
}

#[tokio::test]
async fn test_invalid_bodies_rejected() {
    let queue = MockWorkQueue::new();
    let index = MockDedupIndex::new();

    let malformed = app(&queue, &index)
        .oneshot(webhook("{not json"))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let empty_room = app(&queue, &index)
        .oneshot(webhook(json!({"room_id": "  "}).to_string()))
        .await
        .unwrap();
    assert_eq!(empty_room.status(), StatusCode::BAD_REQUEST);

    assert_eq!(queue.push_count(), 0);
    assert_eq!(index.count(), 0);
}

#[tokio::test]
async fn test_push_failure_releases_room() {
    let queue = MockWorkQueue::new();
    queue.set_fail_push(true);
    let index = MockDedupIndex::new();

    let response = app(&queue, &index)
        .oneshot(webhook(json!({"room_id": "r3"}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!index.has("r3"));
    assert_eq!(index.release_count("r3"), 1);
}

#[tokio::test]
async fn test_health_check() {
    let queue = MockWorkQueue::new();
    let index = MockDedupIndex::new();

    let response = app(&queue, &index)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "allocator-api");
}
