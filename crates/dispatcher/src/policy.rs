use allocator_core::{
    config::{DispatcherConfig, FailurePolicyKind},
    models::{AbandonReason, AssignmentRequest},
};

/// 分配失败后的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// 首次失败即放弃
    Abandon,
    /// 重新入队，`retry_count` 达到上限后放弃
    BoundedRequeue { max_retries: u32 },
}

/// 策略给出的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDecision {
    /// 带着递增后的重试次数重新入队
    Requeue(AssignmentRequest),
    Abandon(AbandonReason),
}

impl FailurePolicy {
    pub fn from_config(config: &DispatcherConfig) -> Self {
        match config.failure_policy {
            FailurePolicyKind::Abandon => FailurePolicy::Abandon,
            FailurePolicyKind::BoundedRequeue => FailurePolicy::BoundedRequeue {
                max_retries: config.max_retries,
            },
        }
    }

    pub fn decide(&self, request: &AssignmentRequest, reason: AbandonReason) -> FailureDecision {
        match *self {
            FailurePolicy::Abandon => FailureDecision::Abandon(reason),
            FailurePolicy::BoundedRequeue { max_retries } => {
                if request.retry_count >= max_retries {
                    FailureDecision::Abandon(AbandonReason::RetryBudgetExhausted {
                        retry_count: request.retry_count,
                        max_retries,
                    })
                } else {
                    FailureDecision::Requeue(request.next_attempt())
                }
            }
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::BoundedRequeue { max_retries: 3 }
    }
}
