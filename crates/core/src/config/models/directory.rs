use serde::{Deserialize, Serialize};

/// 坐席目录HTTP客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub app_id: String,
    pub secret_key: String,
    pub app_id_header: String,
    pub secret_key_header: String,
    pub request_timeout_seconds: u64,
    /// 分配时把上限作为 `max_agent` 一并提交
    pub forward_ceiling: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            app_id: String::new(),
            secret_key: String::new(),
            app_id_header: "Qiscus-App-Id".to_string(),
            secret_key_header: "Qiscus-Secret-Key".to_string(),
            request_timeout_seconds: 10,
            forward_ceiling: false,
        }
    }
}

impl DirectoryConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            return Err(anyhow::anyhow!("坐席目录地址不能为空"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "坐席目录地址必须是http://或https://格式: {}",
                self.base_url
            ));
        }

        if self.app_id_header.is_empty() || self.secret_key_header.is_empty() {
            return Err(anyhow::anyhow!("认证请求头名称不能为空"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("坐席目录请求超时时间必须大于0"));
        }

        Ok(())
    }

    /// 去掉末尾斜杠的基础地址
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
