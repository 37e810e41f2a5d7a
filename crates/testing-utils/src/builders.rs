//! Test data builders for creating test entities
//!
//! This module provides builder patterns for creating test data with
//! sensible defaults and easy customization.

use allocator_core::{
    config::{AppConfig, QueueBackend},
    models::{Agent, AssignmentRequest},
};

/// Builder for creating test AssignmentRequest entities
pub struct AssignmentRequestBuilder {
    request: AssignmentRequest,
}

impl AssignmentRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: AssignmentRequest::new("room-1", 1),
        }
    }

    pub fn with_room_id(mut self, room_id: &str) -> Self {
        self.request.room_id = room_id.to_string();
        self
    }

    pub fn with_candidate(mut self, agent_id: i64) -> Self {
        self.request.candidate_agent_id = agent_id;
        self
    }

    pub fn without_candidate(mut self) -> Self {
        self.request.candidate_agent_id = 0;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.request.retry_count = retry_count;
        self
    }

    pub fn build(self) -> AssignmentRequest {
        self.request
    }
}

impl Default for AssignmentRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `(id, current_customer_count)` 列表转换为坐席列表
pub fn agents(loads: &[(i64, i64)]) -> Vec<Agent> {
    loads
        .iter()
        .map(|(id, load)| Agent::new(*id, format!("agent-{id}"), *load))
        .collect()
}

/// Builder for creating test AppConfig values
///
/// 默认使用内存队列，坐席目录指向本地地址。
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.queue.backend = QueueBackend::InMemory;
        config.directory.base_url = "http://127.0.0.1:1".to_string();
        config.directory.app_id = "test-app".to_string();
        config.directory.secret_key = "test-secret".to_string();
        Self { config }
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
