use async_trait::async_trait;
use std::time::Duration;

use crate::{models::AssignmentRequest, Result};

/// 一次弹出的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    /// 队首的原始负载，由调用方负责解析
    Payload(String),
    /// 等待时间内没有新请求
    Idle,
    /// 队列已关闭且已取空
    Closed,
}

/// 工作队列抽象接口
///
/// 至少一次投递的FIFO队列，入口服务写入，调度器阻塞弹出。
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// 将请求追加到队尾
    async fn push(&self, request: &AssignmentRequest) -> Result<()>;

    /// 将请求放回队首，下一次弹出时最先取到
    async fn push_front(&self, request: &AssignmentRequest) -> Result<()>;

    /// 阻塞弹出队首的原始负载，最多等待 `timeout`
    ///
    /// 返回后不会有弹出操作残留在后端，调用方可以在两次调用之间安全退出。
    async fn pop(&self, timeout: Duration) -> Result<Dequeued>;

    /// 获取队列中等待的请求数量
    async fn len(&self) -> Result<usize>;
}

/// 去重索引抽象接口
///
/// 记录正在处理中的房间，入口服务据此拒绝重复提交。
#[async_trait]
pub trait DedupIndex: Send + Sync {
    /// 尝试登记房间，已存在时返回 `false`
    async fn try_admit(&self, room_id: &str) -> Result<bool>;

    /// 移除房间，房间原本存在时返回 `true`
    async fn release(&self, room_id: &str) -> Result<bool>;

    /// 房间是否处于处理中
    async fn contains(&self, room_id: &str) -> Result<bool>;
}
