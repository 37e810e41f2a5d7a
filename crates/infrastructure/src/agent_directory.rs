use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use allocator_core::{
    config::DirectoryConfig,
    models::Agent,
    traits::{AgentDirectory, AssignCommand},
    AllocatorError, Result,
};

const GET_BY_IDS_PATH: &str = "/api/v1/admin/agents/get_by_ids";
const AVAILABLE_AGENTS_PATH: &str = "/api/v2/admin/service/available_agents";
const ASSIGN_AGENT_PATH: &str = "/api/v1/admin/service/assign_agent";

#[derive(Debug, Deserialize)]
struct AgentListResponse {
    #[serde(default)]
    data: Vec<Agent>,
}

#[derive(Debug, Deserialize)]
struct AvailableAgentsResponse {
    data: AvailableAgentsData,
}

#[derive(Debug, Deserialize)]
struct AvailableAgentsData {
    #[serde(default)]
    agents: Vec<Agent>,
}

/// 基于HTTP的坐席目录客户端
///
/// 每个请求都携带两个认证头，并设置独立的超时时间，
/// 避免单次调用卡住唯一的消费循环。
#[derive(Debug, Clone)]
pub struct HttpAgentDirectory {
    http_client: Client,
    base_url: String,
    app_id_header: String,
    app_id: String,
    secret_key_header: String,
    secret_key: String,
}

impl HttpAgentDirectory {
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AllocatorError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        // 提前校验地址，避免每次请求时才发现问题
        url::Url::parse(config.trimmed_base_url()).map_err(|e| {
            AllocatorError::Configuration(format!("无效的坐席目录地址 {}: {e}", config.base_url))
        })?;

        Ok(Self {
            http_client,
            base_url: config.trimmed_base_url().to_string(),
            app_id_header: config.app_id_header.clone(),
            app_id: config.app_id.clone(),
            secret_key_header: config.secret_key_header.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(self.app_id_header.as_str(), self.app_id.as_str())
            .header(self.secret_key_header.as_str(), self.secret_key.as_str())
    }

    async fn send(&self, builder: RequestBuilder, operation: &str) -> Result<reqwest::Response> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| AllocatorError::Directory(format!("{operation} 请求失败: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("坐席目录 {} 返回状态码 {}", operation, status);
            return Err(AllocatorError::DirectoryStatus {
                status: status.as_u16(),
                operation: operation.to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl AgentDirectory for HttpAgentDirectory {
    async fn agent_load(&self, agent_id: i64) -> Result<Agent> {
        let url = format!("{}{}", self.base_url, GET_BY_IDS_PATH);
        debug!(agent_id, "查询坐席负载");

        let request = self
            .http_client
            .get(&url)
            .query(&[("ids[]", agent_id.to_string())]);
        let response = self.send(request, "get_by_ids").await?;

        let body: AgentListResponse = response
            .json()
            .await
            .map_err(|e| AllocatorError::Directory(format!("解析坐席信息失败: {e}")))?;

        body.data
            .into_iter()
            .next()
            .ok_or(AllocatorError::AgentNotFound { id: agent_id })
    }

    async fn available_agents(&self, room_id: &str) -> Result<Vec<Agent>> {
        let url = format!("{}{}", self.base_url, AVAILABLE_AGENTS_PATH);
        debug!(room_id, "查询可用坐席");

        let request = self.http_client.get(&url).query(&[("room_id", room_id)]);
        let response = self.send(request, "available_agents").await?;

        let body: AvailableAgentsResponse = response
            .json()
            .await
            .map_err(|e| AllocatorError::Directory(format!("解析可用坐席失败: {e}")))?;

        Ok(body.data.agents)
    }

    async fn assign(&self, command: &AssignCommand) -> Result<()> {
        let url = format!("{}{}", self.base_url, ASSIGN_AGENT_PATH);

        let mut form = vec![
            ("agent_id", command.agent_id.to_string()),
            ("room_id", command.room_id.clone()),
        ];
        if let Some(max_agent) = command.max_agent {
            form.push(("max_agent", max_agent.to_string()));
        }

        let request = self.http_client.post(&url).form(&form);
        self.send(request, "assign_agent").await?;

        debug!(room_id = %command.room_id, agent_id = command.agent_id, "坐席分配调用成功");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = DirectoryConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(HttpAgentDirectory::new(&config).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = DirectoryConfig {
            base_url: "https://omni.example.com/".to_string(),
            ..Default::default()
        };
        let directory = HttpAgentDirectory::new(&config).unwrap();
        assert_eq!(directory.base_url(), "https://omni.example.com");
    }
}
