use async_trait::async_trait;

use crate::{models::Agent, Result};

/// 分配指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignCommand {
    pub room_id: String,
    pub agent_id: i64,
    /// 透传给坐席目录的上限，由目录自行校验
    pub max_agent: Option<i64>,
}

impl AssignCommand {
    pub fn new(room_id: impl Into<String>, agent_id: i64) -> Self {
        Self {
            room_id: room_id.into(),
            agent_id,
            max_agent: None,
        }
    }

    pub fn with_max_agent(mut self, max_agent: i64) -> Self {
        self.max_agent = Some(max_agent);
        self
    }
}

/// 外部坐席目录
///
/// 坐席负载的权威来源，同时负责真正执行分配。
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// 查询坐席当前负载
    async fn agent_load(&self, agent_id: i64) -> Result<Agent>;

    /// 查询可接待该房间的坐席，顺序由目录决定
    async fn available_agents(&self, room_id: &str) -> Result<Vec<Agent>>;

    /// 将房间分配给坐席
    async fn assign(&self, command: &AssignCommand) -> Result<()>;
}
