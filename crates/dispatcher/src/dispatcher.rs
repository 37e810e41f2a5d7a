use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use allocator_core::{
    config::{DirectoryConfig, DispatcherConfig},
    models::{AbandonReason, AssignmentRequest, CapacityCeiling, DispatchOutcome},
    traits::{AgentDirectory, DedupIndex, Dequeued, WorkQueue},
    Result,
};

use crate::capacity_wait::{CapacityWaiter, WaitResult};
use crate::metrics;
use crate::policy::{FailureDecision, FailurePolicy};

/// 弹出失败后的退避时间
const QUEUE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// 分配器运行参数
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub ceiling: CapacityCeiling,
    pub poll_interval: Duration,
    pub max_wait: Option<Duration>,
    pub failure_policy: FailurePolicy,
    pub forward_ceiling: bool,
    /// 单次弹出的服务端等待时间，两次弹出之间检查关闭信号
    pub pop_timeout: Duration,
}

impl DispatcherSettings {
    pub fn from_config(dispatcher: &DispatcherConfig, directory: &DirectoryConfig) -> Self {
        Self {
            ceiling: dispatcher.capacity_ceiling(),
            poll_interval: dispatcher.poll_interval(),
            max_wait: dispatcher.max_wait(),
            failure_policy: FailurePolicy::from_config(dispatcher),
            forward_ceiling: directory.forward_ceiling,
            pop_timeout: dispatcher.pop_timeout(),
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::from_config(&DispatcherConfig::default(), &DirectoryConfig::default())
    }
}

/// 分配器
///
/// 单消费者顺序处理：阻塞弹出一条请求，处理到终态（或在容量等待中分配成功）
/// 之后才会弹出下一条。弹出不与关闭信号竞争，退出时不会有在途的弹出。
pub struct Dispatcher {
    queue: Arc<dyn WorkQueue>,
    dedup_index: Arc<dyn DedupIndex>,
    directory: Arc<dyn AgentDirectory>,
    waiter: CapacityWaiter,
    settings: DispatcherSettings,
    /// 容量等待期间已消费了关闭信号
    stopping: AtomicBool,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        dedup_index: Arc<dyn DedupIndex>,
        directory: Arc<dyn AgentDirectory>,
        settings: DispatcherSettings,
    ) -> Self {
        let waiter = CapacityWaiter::new(
            directory.clone(),
            settings.ceiling,
            settings.poll_interval,
            settings.max_wait,
            settings.forward_ceiling,
        );

        Self {
            queue,
            dedup_index,
            directory,
            waiter,
            settings,
            stopping: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// 消费循环，直到收到关闭信号或队列关闭
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!(
            ceiling = %self.settings.ceiling,
            policy = ?self.settings.failure_policy,
            pop_timeout = ?self.settings.pop_timeout,
            "分配器启动"
        );

        loop {
            if shutdown_requested(&mut shutdown_rx) {
                info!("分配器收到关闭信号");
                break;
            }

            match self.queue.pop(self.settings.pop_timeout).await {
                Ok(Dequeued::Payload(payload)) => {
                    self.handle_payload(&payload, &mut shutdown_rx).await;
                    if self.stopping.load(Ordering::SeqCst) {
                        info!("分配器在容量等待中收到关闭信号");
                        break;
                    }
                }
                Ok(Dequeued::Idle) => continue,
                Ok(Dequeued::Closed) => {
                    info!("工作队列已关闭，分配器退出");
                    break;
                }
                Err(e) => {
                    error!("从工作队列弹出失败: {}", e);
                    tokio::select! {
                        _ = sleep(QUEUE_ERROR_BACKOFF) => {}
                        _ = shutdown_rx.recv() => {
                            info!("分配器收到关闭信号");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// 解析并处理一条原始负载，格式错误的负载直接丢弃
    pub async fn handle_payload(
        &self,
        payload: &str,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Option<DispatchOutcome> {
        match AssignmentRequest::decode(payload) {
            Ok(request) => {
                metrics::record_decoded();
                Some(self.process(request, shutdown_rx).await)
            }
            Err(e) => {
                metrics::record_decode_error();
                warn!("丢弃无法解析的队列消息: {}", e);
                None
            }
        }
    }

    /// 处理一条请求并返回最终结果
    pub async fn process(
        &self,
        request: AssignmentRequest,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> DispatchOutcome {
        debug!(
            room_id = %request.room_id,
            candidate_agent_id = request.candidate_agent_id,
            retry_count = request.retry_count,
            "开始处理分配请求"
        );

        let outcome = self.dispatch(&request, shutdown_rx).await;
        self.finish(&request, &outcome).await;
        outcome
    }

    async fn dispatch(
        &self,
        request: &AssignmentRequest,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> DispatchOutcome {
        if !request.has_candidate() {
            if self.settings.ceiling.is_enabled() {
                return self
                    .defer(request, "未指定候选坐席".to_string(), shutdown_rx)
                    .await;
            }
            return DispatchOutcome::Abandoned {
                reason: AbandonReason::AgentLookupFailed("未指定候选坐席".to_string()),
            };
        }

        let agent = match self.directory.agent_load(request.candidate_agent_id).await {
            Ok(agent) => agent,
            Err(e) => {
                return DispatchOutcome::Abandoned {
                    reason: AbandonReason::AgentLookupFailed(e.to_string()),
                };
            }
        };

        if !self.settings.ceiling.admits(agent.current_customer_count) {
            let reason = format!(
                "坐席 {} 当前接待 {}，已达上限 {}",
                agent.id, agent.current_customer_count, self.settings.ceiling
            );
            return self.defer(request, reason, shutdown_rx).await;
        }

        let command = self
            .waiter
            .assign_command(&request.room_id, request.candidate_agent_id);
        match self.directory.assign(&command).await {
            Ok(()) => DispatchOutcome::Assigned {
                agent_id: request.candidate_agent_id,
            },
            Err(e) => {
                self.on_failure(request, AbandonReason::AssignmentFailed(e.to_string()))
                    .await
            }
        }
    }

    /// 候选坐席已满，进入容量等待
    async fn defer(
        &self,
        request: &AssignmentRequest,
        reason: String,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> DispatchOutcome {
        let deferred = DispatchOutcome::Deferred { reason };
        self.record(request, &deferred);

        match self.waiter.wait_for_agent(&request.room_id, shutdown_rx).await {
            WaitResult::Assigned { agent_id } => DispatchOutcome::Assigned { agent_id },
            WaitResult::TimedOut { waited } => {
                self.on_failure(
                    request,
                    AbandonReason::WaitHorizonExceeded {
                        waited_seconds: waited.as_secs(),
                    },
                )
                .await
            }
            WaitResult::Shutdown => {
                self.stopping.store(true, Ordering::SeqCst);
                // 原样放回队首，重启后先处理它
                match self.queue.push_front(request).await {
                    Ok(()) => DispatchOutcome::Requeued {
                        retry_count: request.retry_count,
                    },
                    Err(e) => DispatchOutcome::Abandoned {
                        reason: AbandonReason::AssignmentFailed(format!(
                            "关闭时放回队列失败: {e}"
                        )),
                    },
                }
            }
        }
    }

    async fn on_failure(&self, request: &AssignmentRequest, reason: AbandonReason) -> DispatchOutcome {
        warn!(
            room_id = %request.room_id,
            agent_id = request.candidate_agent_id,
            retry_count = request.retry_count,
            "分配失败: {}",
            reason
        );

        match self.settings.failure_policy.decide(request, reason) {
            FailureDecision::Requeue(next) => match self.queue.push(&next).await {
                Ok(()) => DispatchOutcome::Requeued {
                    retry_count: next.retry_count,
                },
                Err(e) => DispatchOutcome::Abandoned {
                    reason: AbandonReason::AssignmentFailed(format!("重新入队失败: {e}")),
                },
            },
            FailureDecision::Abandon(reason) => DispatchOutcome::Abandoned { reason },
        }
    }

    /// 记录结果，终态时清理去重索引
    async fn finish(&self, request: &AssignmentRequest, outcome: &DispatchOutcome) {
        self.record(request, outcome);

        if !outcome.is_terminal() {
            return;
        }

        // 清理失败不回滚分配，最多导致该房间被误判为重复
        if let Err(e) = self.dedup_index.release(&request.room_id).await {
            error!(
                room_id = %request.room_id,
                "从去重索引移除房间失败: {}",
                e
            );
        }
    }

    fn record(&self, request: &AssignmentRequest, outcome: &DispatchOutcome) {
        metrics::record_outcome(outcome);

        let room_id = request.room_id.as_str();
        let kind = outcome.kind();
        match outcome {
            DispatchOutcome::Assigned { agent_id } => {
                info!(room_id, agent_id, outcome = kind, "分配成功");
            }
            DispatchOutcome::Deferred { reason } => {
                info!(
                    room_id,
                    agent_id = request.candidate_agent_id,
                    outcome = kind,
                    "候选坐席已满，等待空闲坐席: {}",
                    reason
                );
            }
            DispatchOutcome::Requeued { retry_count } => {
                warn!(
                    room_id,
                    agent_id = request.candidate_agent_id,
                    retry_count,
                    outcome = kind,
                    "请求已重新入队"
                );
            }
            DispatchOutcome::Abandoned { reason } => {
                error!(
                    room_id,
                    agent_id = request.candidate_agent_id,
                    retry_count = request.retry_count,
                    outcome = kind,
                    "放弃分配请求，房间不会被分配: {}",
                    reason
                );
            }
        }
    }
}

/// 发送端已关闭或消息滞后都视为关闭
fn shutdown_requested(shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
    !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty))
}
