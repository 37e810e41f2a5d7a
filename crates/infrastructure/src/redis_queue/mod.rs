//! Redis队列模块
//!
//! 工作队列使用Redis列表，尾部 `RPUSH` 写入，头部 `BLPOP` 阻塞弹出；
//! 去重索引使用Redis集合。
//!
//! `BLPOP` 使用服务端超时，调用返回时服务端不再保留该弹出命令，
//! 调用方只在两次调用之间退出，不会把请求交给已无人接收的连接。

pub mod connection_manager;

pub use connection_manager::RedisConnector;

use async_trait::async_trait;
use std::time::Duration;
use redis::{aio::ConnectionManager, aio::MultiplexedConnection, AsyncCommands};
use tracing::debug;

use allocator_core::{
    config::QueueConfig,
    models::AssignmentRequest,
    traits::{DedupIndex, Dequeued, WorkQueue},
    AllocatorError, Result,
};

/// 基于Redis列表的工作队列
pub struct RedisWorkQueue {
    commands: ConnectionManager,
    blocking: MultiplexedConnection,
    queue_key: String,
}

impl RedisWorkQueue {
    pub fn new(
        commands: ConnectionManager,
        blocking: MultiplexedConnection,
        queue_key: impl Into<String>,
    ) -> Self {
        Self {
            commands,
            blocking,
            queue_key: queue_key.into(),
        }
    }
}

#[async_trait]
impl WorkQueue for RedisWorkQueue {
    async fn push(&self, request: &AssignmentRequest) -> Result<()> {
        let payload = request.encode()?;
        let mut conn = self.commands.clone();
        let _: i64 = conn
            .rpush(&self.queue_key, payload)
            .await
            .map_err(|e| AllocatorError::Queue(format!("写入队列失败: {e}")))?;
        debug!(room_id = %request.room_id, queue = %self.queue_key, "请求已入队");
        Ok(())
    }

    async fn push_front(&self, request: &AssignmentRequest) -> Result<()> {
        let payload = request.encode()?;
        let mut conn = self.commands.clone();
        let _: i64 = conn
            .lpush(&self.queue_key, payload)
            .await
            .map_err(|e| AllocatorError::Queue(format!("放回队首失败: {e}")))?;
        debug!(room_id = %request.room_id, queue = %self.queue_key, "请求已放回队首");
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Dequeued> {
        let mut conn = self.blocking.clone();
        let popped: Option<(String, String)> = conn
            .blpop(&self.queue_key, timeout.as_secs_f64())
            .await
            .map_err(|e| AllocatorError::Queue(format!("弹出队列失败: {e}")))?;
        Ok(match popped {
            Some((_, payload)) => Dequeued::Payload(payload),
            None => Dequeued::Idle,
        })
    }

    async fn len(&self) -> Result<usize> {
        let mut conn = self.commands.clone();
        conn.llen(&self.queue_key)
            .await
            .map_err(|e| AllocatorError::Queue(format!("获取队列长度失败: {e}")))
    }
}

/// 基于Redis集合的去重索引
#[derive(Clone)]
pub struct RedisDedupIndex {
    commands: ConnectionManager,
    dedup_key: String,
}

impl RedisDedupIndex {
    pub fn new(commands: ConnectionManager, dedup_key: impl Into<String>) -> Self {
        Self {
            commands,
            dedup_key: dedup_key.into(),
        }
    }
}

#[async_trait]
impl DedupIndex for RedisDedupIndex {
    async fn try_admit(&self, room_id: &str) -> Result<bool> {
        let mut conn = self.commands.clone();
        let added: i64 = conn
            .sadd(&self.dedup_key, room_id)
            .await
            .map_err(|e| AllocatorError::DedupIndex(format!("写入去重索引失败: {e}")))?;
        Ok(added == 1)
    }

    async fn release(&self, room_id: &str) -> Result<bool> {
        let mut conn = self.commands.clone();
        let removed: i64 = conn
            .srem(&self.dedup_key, room_id)
            .await
            .map_err(|e| AllocatorError::DedupIndex(format!("移除去重索引失败: {e}")))?;
        Ok(removed == 1)
    }

    async fn contains(&self, room_id: &str) -> Result<bool> {
        let mut conn = self.commands.clone();
        conn.sismember(&self.dedup_key, room_id)
            .await
            .map_err(|e| AllocatorError::DedupIndex(format!("查询去重索引失败: {e}")))
    }
}

/// 连接Redis并创建队列与去重索引，两者共享命令连接
pub async fn connect(config: &QueueConfig) -> Result<(RedisWorkQueue, RedisDedupIndex)> {
    let connector = RedisConnector::new(config)?;
    let commands = connector.connect().await?;
    let blocking = connector.blocking_connection().await?;

    Ok((
        RedisWorkQueue::new(commands.clone(), blocking, config.queue_key.clone()),
        RedisDedupIndex::new(commands, config.dedup_key.clone()),
    ))
}
