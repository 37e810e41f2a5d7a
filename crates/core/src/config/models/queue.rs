use serde::{Deserialize, Serialize};

/// 队列后端类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    #[default]
    Redis,
    InMemory,
}

/// 工作队列与去重索引配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub backend: QueueBackend,
    pub url: String,
    pub queue_key: String,
    pub dedup_key: String,
    pub connect_retry_delay_seconds: u64,
    /// 启动时连接Redis的最大尝试次数，0 表示一直重试
    pub connect_max_attempts: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            url: "redis://127.0.0.1:6379".to_string(),
            queue_key: "customers_queue".to_string(),
            dedup_key: "customers_index".to_string(),
            connect_retry_delay_seconds: 5,
            connect_max_attempts: 0,
        }
    }
}

impl QueueConfig {
    /// Validate queue configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.queue_key.is_empty() {
            return Err(anyhow::anyhow!("队列名称不能为空"));
        }

        if self.dedup_key.is_empty() {
            return Err(anyhow::anyhow!("去重索引名称不能为空"));
        }

        if self.queue_key == self.dedup_key {
            return Err(anyhow::anyhow!("队列名称与去重索引名称不能相同"));
        }

        if self.backend == QueueBackend::Redis {
            if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
                return Err(anyhow::anyhow!("Redis URL必须是redis://或rediss://格式"));
            }

            if self.connect_retry_delay_seconds == 0 {
                return Err(anyhow::anyhow!("Redis重连间隔必须大于0"));
            }
        }

        Ok(())
    }

    /// 日志中使用的URL，隐藏密码
    pub fn masked_url(&self) -> String {
        mask_url_password(&self.url)
    }
}

/// 屏蔽URL中的敏感信息
pub fn mask_url_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if url[..colon_pos].ends_with('/') || url[..colon_pos].contains("//") {
                let mut masked = url.to_string();
                masked.replace_range(colon_pos + 1..at_pos, "***");
                return masked;
            }
        }
    }
    url.to_string()
}
