use allocator_core::{
    config::{DirectoryConfig, QueueBackend, QueueConfig},
    models::AssignmentRequest,
    traits::Dequeued,
};
use std::time::Duration;
use allocator_infrastructure::BackendFactory;

#[tokio::test]
async fn test_in_memory_backends_share_state() {
    let config = QueueConfig {
        backend: QueueBackend::InMemory,
        ..Default::default()
    };

    let backends = BackendFactory::create_queue(&config).await.unwrap();
    let cloned = backends.clone();

    backends
        .queue
        .push(&AssignmentRequest::new("r1", 42))
        .await
        .unwrap();
    assert!(backends.dedup_index.try_admit("r1").await.unwrap());

    assert_eq!(cloned.queue.len().await.unwrap(), 1);
    assert!(cloned.dedup_index.contains("r1").await.unwrap());
}

#[tokio::test]
async fn test_close_ends_in_memory_consumer() {
    let config = QueueConfig {
        backend: QueueBackend::InMemory,
        ..Default::default()
    };
    let backends = BackendFactory::create_queue(&config).await.unwrap();

    backends.close();

    assert_eq!(
        backends.queue.pop(Duration::from_secs(1)).await.unwrap(),
        Dequeued::Closed
    );
}

#[test]
fn test_create_directory_validates_url() {
    let config = DirectoryConfig {
        base_url: "https://omni.example.com".to_string(),
        ..Default::default()
    };
    assert!(BackendFactory::create_directory(&config).is_ok());

    let config = DirectoryConfig {
        base_url: "::".to_string(),
        ..Default::default()
    };
    assert!(BackendFactory::create_directory(&config).is_err());
}
