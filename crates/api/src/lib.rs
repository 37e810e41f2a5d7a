//! # Allocator API
//!
//! 入口服务：接收分配回调，按房间去重后写入工作队列。
//!
//! ## API 端点
//!
//! - `POST /webhook` - 提交分配请求，重复的房间返回 409
//! - `GET /health` - 健康检查

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;

use allocator_core::traits::{DedupIndex, WorkQueue};
use middleware::{cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(queue: Arc<dyn WorkQueue>, dedup_index: Arc<dyn DedupIndex>) -> Router {
    let state = AppState { queue, dedup_index };

    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
