use thiserror::Error;

/// 分配系统错误类型定义
#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error("队列错误: {0}")]
    Queue(String),

    #[error("去重索引错误: {0}")]
    DedupIndex(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("队列消息解析失败: {0}")]
    Decode(String),

    #[error("坐席目录请求失败: {0}")]
    Directory(String),

    #[error("坐席目录 {operation} 返回状态码 {status}")]
    DirectoryStatus { status: u16, operation: String },

    #[error("坐席未找到: {id}")]
    AgentNotFound { id: i64 },

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl AllocatorError {
    /// 是否为可恢复的瞬时错误（网络、非2xx响应、队列连接）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AllocatorError::Directory(_)
                | AllocatorError::DirectoryStatus { .. }
                | AllocatorError::Queue(_)
                | AllocatorError::DedupIndex(_)
        )
    }
}

impl From<serde_json::Error> for AllocatorError {
    fn from(err: serde_json::Error) -> Self {
        AllocatorError::Serialization(err.to_string())
    }
}

/// 统一的Result类型
pub type Result<T> = std::result::Result<T, AllocatorError>;
