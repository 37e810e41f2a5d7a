//! 需要本地Redis: `docker run -p 6379:6379 redis`，然后
//! `cargo test -p allocator-infrastructure -- --ignored`

use std::time::Duration;

use allocator_core::{
    config::QueueConfig,
    models::AssignmentRequest,
    traits::{DedupIndex, Dequeued, WorkQueue},
};
use allocator_infrastructure::redis_queue;
use allocator_testing_utils::TestEnv;

fn test_config() -> QueueConfig {
    QueueConfig {
        url: "redis://127.0.0.1:6379".to_string(),
        queue_key: TestEnv::unique_name("test_customers_queue"),
        dedup_key: TestEnv::unique_name("test_customers_index"),
        connect_max_attempts: 1,
        ..Default::default()
    }
}

const WAIT: Duration = Duration::from_secs(1);

fn room_of(dequeued: Dequeued) -> String {
    match dequeued {
        Dequeued::Payload(payload) => AssignmentRequest::decode(&payload).unwrap().room_id,
        other => panic!("expected payload, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn test_redis_queue_fifo_roundtrip() {
    let (queue, _index) = redis_queue::connect(&test_config()).await.unwrap();

    queue.push(&AssignmentRequest::new("r1", 1)).await.unwrap();
    queue.push(&AssignmentRequest::new("r2", 2)).await.unwrap();
    assert_eq!(queue.len().await.unwrap(), 2);

    assert_eq!(room_of(queue.pop(WAIT).await.unwrap()), "r1");
    assert_eq!(room_of(queue.pop(WAIT).await.unwrap()), "r2");
    assert_eq!(queue.len().await.unwrap(), 0);
}

#[tokio::test]
#[ignore]
async fn test_redis_push_front_goes_to_head() {
    let (queue, _index) = redis_queue::connect(&test_config()).await.unwrap();

    queue.push(&AssignmentRequest::new("r2", 2)).await.unwrap();
    queue.push_front(&AssignmentRequest::new("r1", 1)).await.unwrap();

    assert_eq!(room_of(queue.pop(WAIT).await.unwrap()), "r1");
    assert_eq!(room_of(queue.pop(WAIT).await.unwrap()), "r2");
}

#[tokio::test]
#[ignore]
async fn test_redis_idle_pop_leaves_later_push_in_queue() {
    let (queue, _index) = redis_queue::connect(&test_config()).await.unwrap();

    assert_eq!(queue.pop(WAIT).await.unwrap(), Dequeued::Idle);

    // 空闲返回后服务端没有残留的BLPOP，新请求留在队列中
    queue.push(&AssignmentRequest::new("r1", 1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(queue.len().await.unwrap(), 1);
    assert_eq!(room_of(queue.pop(WAIT).await.unwrap()), "r1");
}

#[tokio::test]
#[ignore]
async fn test_redis_dedup_index() {
    let (_queue, index) = redis_queue::connect(&test_config()).await.unwrap();

    assert!(index.try_admit("room-x").await.unwrap());
    assert!(!index.try_admit("room-x").await.unwrap());
    assert!(index.contains("room-x").await.unwrap());
    assert!(index.release("room-x").await.unwrap());
    assert!(!index.contains("room-x").await.unwrap());
}
