use axum::{body::Bytes, extract::State, response::IntoResponse};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use allocator_core::models::AssignmentRequest;

use crate::{
    error::{ApiError, ApiResult},
    response::success,
    routes::AppState,
};

pub const INGRESS_REQUESTS_TOTAL: &str = "allocator_ingress_requests_total";

/// 入口回调请求体
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub candidate_agent: Option<CandidateAgent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateAgent {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueuedRoom {
    pub room_id: String,
    pub candidate_id: i64,
}

/// 接收分配回调：去重后写入工作队列
pub async fn receive_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let result = enqueue(&state, &body).await;

    let label = match &result {
        Ok(_) => "queued",
        Err(ApiError::Conflict(_)) => "duplicate",
        Err(ApiError::BadRequest(_) | ApiError::Serialization(_)) => "invalid",
        Err(_) => "error",
    };
    counter!(INGRESS_REQUESTS_TOTAL, "result" => label).increment(1);

    let queued = result?;
    Ok(success(queued))
}

async fn enqueue(state: &AppState, body: &[u8]) -> ApiResult<QueuedRoom> {
    let payload: WebhookPayload = serde_json::from_slice(body)?;

    let room_id = payload.room_id.trim().to_string();
    if room_id.is_empty() {
        return Err(ApiError::BadRequest("room_id is required".to_string()));
    }
    let candidate_id = payload.candidate_agent.map(|c| c.id).unwrap_or(0);

    if !state.dedup_index.try_admit(&room_id).await? {
        info!(room_id = %room_id, "房间已在处理中，拒绝重复提交");
        return Err(ApiError::Conflict("RoomID already exist".to_string()));
    }

    let request = AssignmentRequest::new(room_id.clone(), candidate_id);
    if let Err(e) = state.queue.push(&request).await {
        error!(room_id = %room_id, "写入工作队列失败: {}", e);
        // 入队失败时撤销登记，允许调用方重试
        if let Err(release_err) = state.dedup_index.release(&room_id).await {
            warn!(room_id = %room_id, "撤销去重登记失败: {}", release_err);
        }
        return Err(e.into());
    }

    info!(room_id = %room_id, candidate_id, "请求已入队");
    Ok(QueuedRoom {
        room_id,
        candidate_id,
    })
}
