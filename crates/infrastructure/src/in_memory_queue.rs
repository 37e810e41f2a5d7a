use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use allocator_core::{
    models::AssignmentRequest,
    traits::{DedupIndex, Dequeued, WorkQueue},
    AllocatorError, Result,
};

/// 内存工作队列实现
///
/// 单进程部署（`--mode all`）和测试使用。`pop` 在队列为空时挂起，
/// 直到有新请求写入、队列被关闭或等待超时。
#[derive(Debug, Default)]
pub struct InMemoryWorkQueue {
    items: Mutex<VecDeque<String>>,
    notify: Notify,
    closed: AtomicBool,
}

impl InMemoryWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 关闭队列，挂起中的 `pop` 在队列取空后返回 `Closed`
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
        debug!("内存队列已关闭");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<String>>> {
        self.items
            .lock()
            .map_err(|e| AllocatorError::Internal(format!("内存队列锁已损坏: {e}")))
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn push(&self, request: &AssignmentRequest) -> Result<()> {
        if self.is_closed() {
            return Err(AllocatorError::Queue("队列已关闭".to_string()));
        }
        let payload = request.encode()?;
        self.lock()?.push_back(payload);
        self.notify.notify_one();
        Ok(())
    }

    async fn push_front(&self, request: &AssignmentRequest) -> Result<()> {
        // 关闭后仍允许放回，保证处理中的请求不丢失
        let payload = request.encode()?;
        self.lock()?.push_front(payload);
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Dequeued> {
        let deadline = Instant::now() + timeout;

        loop {
            // 先注册等待再检查队列，避免丢失关闭通知
            let notified = self.notify.notified();
            {
                let mut items = self.lock()?;
                if let Some(payload) = items.pop_front() {
                    return Ok(Dequeued::Payload(payload));
                }
            }
            if self.is_closed() {
                return Ok(Dequeued::Closed);
            }
            if timeout_at(deadline, notified).await.is_err() {
                return Ok(Dequeued::Idle);
            }
        }
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}

/// 内存去重索引实现
#[derive(Debug, Default)]
pub struct InMemoryDedupIndex {
    rooms: Mutex<HashSet<String>>,
}

impl InMemoryDedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashSet<String>>> {
        self.rooms
            .lock()
            .map_err(|e| AllocatorError::Internal(format!("去重索引锁已损坏: {e}")))
    }
}

#[async_trait]
impl DedupIndex for InMemoryDedupIndex {
    async fn try_admit(&self, room_id: &str) -> Result<bool> {
        Ok(self.lock()?.insert(room_id.to_string()))
    }

    async fn release(&self, room_id: &str) -> Result<bool> {
        Ok(self.lock()?.remove(room_id))
    }

    async fn contains(&self, room_id: &str) -> Result<bool> {
        Ok(self.lock()?.contains(room_id))
    }
}
