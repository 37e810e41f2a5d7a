use std::fmt;

/// 放弃处理的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbandonReason {
    /// 查询候选坐席负载失败（网络错误或坐席不存在）
    AgentLookupFailed(String),
    /// 分配调用失败且失败策略不重新入队
    AssignmentFailed(String),
    /// 重试次数已达上限
    RetryBudgetExhausted { retry_count: u32, max_retries: u32 },
    /// 等待空闲坐席超过最长等待时间
    WaitHorizonExceeded { waited_seconds: u64 },
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbandonReason::AgentLookupFailed(e) => write!(f, "查询坐席失败: {e}"),
            AbandonReason::AssignmentFailed(e) => write!(f, "分配失败: {e}"),
            AbandonReason::RetryBudgetExhausted {
                retry_count,
                max_retries,
            } => write!(f, "重试次数已用尽 ({retry_count}/{max_retries})"),
            AbandonReason::WaitHorizonExceeded { waited_seconds } => {
                write!(f, "等待空闲坐席超时 ({waited_seconds}s)")
            }
        }
    }
}

/// 单条分配请求的处理结果，仅用于日志和指标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Assigned { agent_id: i64 },
    /// 候选坐席已满，进入等待轮询
    Deferred { reason: String },
    /// 请求已带着新的重试次数放回队列
    Requeued { retry_count: u32 },
    Abandoned { reason: AbandonReason },
}

impl DispatchOutcome {
    /// 指标和日志中使用的结果类型
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchOutcome::Assigned { .. } => "assigned",
            DispatchOutcome::Deferred { .. } => "deferred",
            DispatchOutcome::Requeued { .. } => "requeued",
            DispatchOutcome::Abandoned { .. } => "abandoned",
        }
    }

    /// 终态结果需要把房间从去重索引中移除
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Assigned { .. } | DispatchOutcome::Abandoned { .. }
        )
    }
}
