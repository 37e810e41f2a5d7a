use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use allocator_core::{
    models::CapacityCeiling,
    traits::{AgentDirectory, AssignCommand},
};

use crate::metrics;
use crate::selection::select_first_fit;

/// 等待结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitResult {
    /// 已分配给轮询到的坐席
    Assigned { agent_id: i64 },
    /// 超过最长等待时间
    TimedOut { waited: Duration },
    /// 等待期间收到关闭信号
    Shutdown,
}

/// 容量等待循环
///
/// 候选坐席已满时进入：每隔 `poll_interval` 查询一次可用坐席，选出第一个
/// 负载低于上限的坐席并尝试分配。查询失败、列表为空、分配失败都会进入下一轮；
/// 只有分配成功、超过 `max_wait` 或收到关闭信号时才退出。
pub struct CapacityWaiter {
    directory: Arc<dyn AgentDirectory>,
    ceiling: CapacityCeiling,
    poll_interval: Duration,
    max_wait: Option<Duration>,
    forward_ceiling: bool,
}

impl CapacityWaiter {
    pub fn new(
        directory: Arc<dyn AgentDirectory>,
        ceiling: CapacityCeiling,
        poll_interval: Duration,
        max_wait: Option<Duration>,
        forward_ceiling: bool,
    ) -> Self {
        Self {
            directory,
            ceiling,
            poll_interval,
            max_wait,
            forward_ceiling,
        }
    }

    pub async fn wait_for_agent(
        &self,
        room_id: &str,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> WaitResult {
        let started = Instant::now();
        let mut polls: u64 = 0;

        loop {
            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = shutdown_rx.recv() => {
                    info!(room_id, polls, "等待空闲坐席时收到关闭信号");
                    return WaitResult::Shutdown;
                }
            }

            let waited = started.elapsed();
            if let Some(max_wait) = self.max_wait {
                if waited >= max_wait {
                    warn!(
                        room_id,
                        polls,
                        waited_seconds = waited.as_secs(),
                        "等待空闲坐席超时"
                    );
                    return WaitResult::TimedOut { waited };
                }
            }

            polls += 1;
            metrics::record_capacity_poll();

            let agents = match self.directory.available_agents(room_id).await {
                Ok(agents) => agents,
                Err(e) => {
                    warn!(room_id, polls, "查询可用坐席失败: {}，稍后重试", e);
                    continue;
                }
            };

            let Some(agent) = select_first_fit(&agents, self.ceiling) else {
                debug!(
                    room_id,
                    polls,
                    candidates = agents.len(),
                    "暂无空闲坐席，继续等待"
                );
                continue;
            };

            info!(
                room_id,
                agent_id = agent.id,
                current_customer_count = agent.current_customer_count,
                "找到空闲坐席"
            );

            let command = self.assign_command(room_id, agent.id);
            match self.directory.assign(&command).await {
                Ok(()) => return WaitResult::Assigned { agent_id: agent.id },
                Err(e) => {
                    // 名额可能被其他实例抢占，重新查询
                    warn!(room_id, agent_id = agent.id, "分配空闲坐席失败: {}，继续等待", e);
                }
            }
        }
    }

    pub(crate) fn assign_command(&self, room_id: &str, agent_id: i64) -> AssignCommand {
        let command = AssignCommand::new(room_id, agent_id);
        if self.forward_ceiling && self.ceiling.is_enabled() {
            command.with_max_agent(self.ceiling.as_raw())
        } else {
            command
        }
    }
}
