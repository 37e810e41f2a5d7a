//! 分配器核心
//!
//! 从工作队列消费分配请求，按容量上限判断候选坐席是否可用，
//! 候选坐席已满时轮询等待空闲坐席。

pub mod capacity_wait;
pub mod dispatcher;
pub mod metrics;
pub mod policy;
pub mod selection;

pub use capacity_wait::{CapacityWaiter, WaitResult};
pub use dispatcher::{Dispatcher, DispatcherSettings};
pub use policy::{FailureDecision, FailurePolicy};
pub use selection::select_first_fit;
