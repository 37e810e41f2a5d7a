use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use allocator_core::AllocatorError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("分配系统错误: {0}")]
    Allocator(#[from] AllocatorError),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("请求冲突: {0}")]
    Conflict(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type) = match &self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                "BAD_REQUEST".to_string(),
            ),
            ApiError::Serialization(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body".to_string(),
                "SERIALIZATION_ERROR".to_string(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), "CONFLICT".to_string()),
            ApiError::Allocator(AllocatorError::Queue(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error saving to queue".to_string(),
                "QUEUE_ERROR".to_string(),
            ),
            ApiError::Allocator(AllocatorError::DedupIndex(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error updating room index".to_string(),
                "DEDUP_INDEX_ERROR".to_string(),
            ),
            ApiError::Allocator(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing request".to_string(),
                "INTERNAL_ERROR".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_error_conversion() {
        let api_error: ApiError = AllocatorError::Queue("down".to_string()).into();
        assert!(matches!(api_error, ApiError::Allocator(AllocatorError::Queue(_))));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("room_id is required".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("RoomID already exist".to_string())
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Allocator(AllocatorError::DedupIndex("down".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_serialization_error_is_bad_request() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
