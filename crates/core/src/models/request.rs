use serde::{Deserialize, Serialize};

use crate::errors::{AllocatorError, Result};

/// 队列中的分配请求
///
/// 由入口服务在校验通过后创建，写入工作队列；调度器每次只处理一条。
/// 序列化格式为 `{"room_id": "...", "candidate_id": 0, "retry_count": 0}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub room_id: String,
    /// 提交时指定的坐席，0 表示没有偏好
    #[serde(rename = "candidate_id", default)]
    pub candidate_agent_id: i64,
    #[serde(default)]
    pub retry_count: u32,
}

impl AssignmentRequest {
    pub fn new(room_id: impl Into<String>, candidate_agent_id: i64) -> Self {
        Self {
            room_id: room_id.into(),
            candidate_agent_id,
            retry_count: 0,
        }
    }

    /// 是否指定了候选坐席
    pub fn has_candidate(&self) -> bool {
        self.candidate_agent_id > 0
    }

    /// 生成重新入队的副本，重试次数加一
    pub fn next_attempt(&self) -> Self {
        Self {
            room_id: self.room_id.clone(),
            candidate_agent_id: self.candidate_agent_id,
            retry_count: self.retry_count.saturating_add(1),
        }
    }

    /// 从队列原始负载解析
    pub fn decode(payload: &str) -> Result<Self> {
        let request: AssignmentRequest = serde_json::from_str(payload)
            .map_err(|e| AllocatorError::Decode(format!("{e}: {payload}")))?;

        if request.room_id.trim().is_empty() {
            return Err(AllocatorError::Decode(format!(
                "room_id 不能为空: {payload}"
            )));
        }

        Ok(request)
    }

    /// 序列化为队列负载
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
