use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::CapacityCeiling;

/// 分配调用失败后的处理方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicyKind {
    /// 首次失败即放弃
    Abandon,
    /// 重新入队，直到重试次数达到 `max_retries`
    #[default]
    BoundedRequeue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub enabled: bool,
    /// 每个坐席的最大接待数，-1 表示不限制
    pub max_customers: i64,
    pub poll_interval_seconds: u64,
    /// 单次阻塞弹出的等待时间，到期后检查关闭信号再继续等待
    pub pop_timeout_seconds: u64,
    /// 等待空闲坐席的最长时间，不设置时无限等待
    pub max_wait_seconds: Option<u64>,
    pub failure_policy: FailurePolicyKind,
    pub max_retries: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_customers: CapacityCeiling::DISABLED,
            poll_interval_seconds: 5,
            pop_timeout_seconds: 1,
            max_wait_seconds: None,
            failure_policy: FailurePolicyKind::default(),
            max_retries: 3,
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_customers < CapacityCeiling::DISABLED {
            return Err(anyhow::anyhow!(
                "最大接待数无效: {}，使用 -1 表示不限制",
                self.max_customers
            ));
        }

        if self.poll_interval_seconds == 0 {
            return Err(anyhow::anyhow!("轮询间隔必须大于0"));
        }

        if self.pop_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("队列弹出等待时间必须大于0"));
        }

        if self.max_wait_seconds == Some(0) {
            return Err(anyhow::anyhow!("最长等待时间必须大于0"));
        }

        Ok(())
    }

    pub fn capacity_ceiling(&self) -> CapacityCeiling {
        CapacityCeiling::from(self.max_customers)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn pop_timeout(&self) -> Duration {
        Duration::from_secs(self.pop_timeout_seconds)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_seconds.map(Duration::from_secs)
    }
}
