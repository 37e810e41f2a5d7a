use std::sync::Arc;
use tracing::info;

use allocator_core::{
    config::{DirectoryConfig, QueueBackend, QueueConfig},
    traits::{AgentDirectory, DedupIndex, WorkQueue},
    Result,
};

use crate::{redis_queue, HttpAgentDirectory, InMemoryDedupIndex, InMemoryWorkQueue};

/// 工作队列与去重索引
///
/// 入口服务与分配器共享同一组实例。
#[derive(Clone)]
pub struct QueueBackends {
    pub queue: Arc<dyn WorkQueue>,
    pub dedup_index: Arc<dyn DedupIndex>,
    /// 仅内存后端持有，用于关闭时唤醒挂起的消费者
    pub in_memory: Option<Arc<InMemoryWorkQueue>>,
}

impl QueueBackends {
    /// 关闭内存队列，Redis后端无需处理
    pub fn close(&self) {
        if let Some(queue) = &self.in_memory {
            queue.close();
        }
    }
}

pub struct BackendFactory;

impl BackendFactory {
    pub async fn create_queue(config: &QueueConfig) -> Result<QueueBackends> {
        match config.backend {
            QueueBackend::Redis => {
                info!(
                    "初始化Redis队列: {}，队列 {}，去重索引 {}",
                    config.masked_url(),
                    config.queue_key,
                    config.dedup_key
                );
                let (queue, dedup_index) = redis_queue::connect(config).await?;
                Ok(QueueBackends {
                    queue: Arc::new(queue),
                    dedup_index: Arc::new(dedup_index),
                    in_memory: None,
                })
            }
            QueueBackend::InMemory => {
                info!("初始化内存队列");
                let queue = Arc::new(InMemoryWorkQueue::new());
                Ok(QueueBackends {
                    queue: queue.clone(),
                    dedup_index: Arc::new(InMemoryDedupIndex::new()),
                    in_memory: Some(queue),
                })
            }
        }
    }

    pub fn create_directory(config: &DirectoryConfig) -> Result<Arc<dyn AgentDirectory>> {
        info!(
            "初始化坐席目录客户端: {}，超时 {}秒",
            config.trimmed_base_url(),
            config.request_timeout_seconds
        );
        Ok(Arc::new(HttpAgentDirectory::new(config)?))
    }
}
