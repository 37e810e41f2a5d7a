//! Test helper utilities and common testing patterns

use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;

/// Test environment setup utilities
pub struct TestEnv;

impl TestEnv {
    /// Wait for a condition to be true with timeout
    ///
    /// 适用于需要等待后台任务完成的集成测试。
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = tokio::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(20)).await;
        }

        false
    }

    /// Generate unique test names based on timestamp
    pub fn unique_name(prefix: &str) -> String {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        format!("{}_{}", prefix, timestamp)
    }
}

/// 队列消息的JSON负载
pub fn payload(room_id: &str, candidate_id: i64, retry_count: u32) -> String {
    serde_json::json!({
        "room_id": room_id,
        "candidate_id": candidate_id,
        "retry_count": retry_count,
    })
    .to_string()
}
