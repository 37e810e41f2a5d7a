use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use allocator_core::traits::{DedupIndex, WorkQueue};

use crate::handlers::{health::health_check, webhook::receive_webhook};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn WorkQueue>,
    pub dedup_index: Arc<dyn DedupIndex>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 分配回调
        .route("/webhook", post(receive_webhook))
        .with_state(state)
}
