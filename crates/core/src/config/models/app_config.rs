use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, ConfigBuilder as Builder, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    directory::DirectoryConfig,
    dispatcher::DispatcherConfig,
    queue::QueueConfig,
};

/// 未指定配置文件时尝试加载的默认路径
pub const DEFAULT_CONFIG_PATH: &str = "config/allocator.toml";

/// 环境变量前缀，例如 `ALLOCATOR__DISPATCHER__MAX_CUSTOMERS=3`
pub const ENV_PREFIX: &str = "ALLOCATOR";

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub queue: QueueConfig,
    pub directory: DirectoryConfig,
    pub dispatcher: DispatcherConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: ALLOCATOR__)
    /// 4. 旧部署使用的扁平环境变量（REDIS_ADDR、MAX_AGENTS、OMNI_*、PORT）
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// 与 [`AppConfig::load`] 相同，旧环境变量通过 `lookup` 读取
    pub fn load_with_env<F>(config_path: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ConfigBuilder::builder();

        // 1. Load config file if provided
        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            builder = builder.add_source(File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml));
        }

        // 2. Environment variable overrides
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // 3. Legacy flat variables
        builder = apply_legacy_env(builder, &lookup)?;

        let config = builder.build().context("构建配置失败")?;
        let app_config: AppConfig = config.try_deserialize().context("反序列化配置失败")?;

        app_config.validate().context("配置验证失败")?;

        Ok(app_config)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(toml_str, FileFormat::Toml))
            .build()
            .context("解析TOML配置失败")?;

        let app_config: AppConfig = config.try_deserialize().context("反序列化配置失败")?;

        app_config.validate().context("配置验证失败")?;

        Ok(app_config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.queue.validate().context("队列配置验证失败")?;

        // 坐席目录只有分配器会用到
        if self.dispatcher.enabled {
            self.directory.validate().context("坐席目录配置验证失败")?;
        }

        self.dispatcher.validate().context("分配器配置验证失败")?;
        self.api.validate().context("入口服务配置验证失败")?;
        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        if !self.dispatcher.enabled && !self.api.enabled {
            return Err(anyhow::anyhow!("分配器和入口服务至少需要启用一个"));
        }

        Ok(())
    }
}

fn apply_legacy_env<F>(
    mut builder: Builder<DefaultState>,
    lookup: &F,
) -> Result<Builder<DefaultState>>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(addr) = get("REDIS_ADDR") {
        let url = if addr.contains("://") {
            addr
        } else {
            format!("redis://{addr}")
        };
        builder = builder.set_override("queue.url", url)?;
    }

    if let Some(raw) = get("MAX_AGENTS") {
        let max_customers: i64 = raw
            .trim()
            .parse()
            .with_context(|| format!("MAX_AGENTS 不是有效的整数: {raw}"))?;
        builder = builder.set_override("dispatcher.max_customers", max_customers)?;
    }

    builder = builder
        .set_override_option("directory.base_url", get("OMNI_BASE_URL"))?
        .set_override_option("directory.app_id", get("OMNI_API_KEY"))?
        .set_override_option("directory.secret_key", get("OMNI_API_SECRET"))?;

    if let Some(port) = get("PORT") {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("PORT 不是有效的端口号: {port}"))?;
        builder = builder.set_override("api.bind_address", format!("0.0.0.0:{port}"))?;
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::{FailurePolicyKind, QueueBackend};
    use crate::models::CapacityCeiling;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[directory]
base_url = "https://omni.example.com"
app_id = "app"
secret_key = "secret"
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied_to_partial_file() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();

        assert_eq!(config.queue.backend, QueueBackend::Redis);
        assert_eq!(config.queue.queue_key, "customers_queue");
        assert_eq!(config.queue.dedup_key, "customers_index");
        assert_eq!(config.queue.connect_retry_delay_seconds, 5);
        assert_eq!(config.directory.app_id_header, "Qiscus-App-Id");
        assert_eq!(config.directory.secret_key_header, "Qiscus-Secret-Key");
        assert_eq!(config.dispatcher.capacity_ceiling(), CapacityCeiling::Unlimited);
        assert_eq!(config.dispatcher.poll_interval_seconds, 5);
        assert_eq!(config.dispatcher.max_wait_seconds, None);
        assert_eq!(
            config.dispatcher.failure_policy,
            FailurePolicyKind::BoundedRequeue
        );
        assert_eq!(config.dispatcher.max_retries, 3);
        assert_eq!(config.api.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_directory_rejected_when_dispatcher_enabled() {
        let result = AppConfig::from_toml("");
        assert!(result.is_err());

        let config = AppConfig::from_toml(
            r#"
[dispatcher]
enabled = false
"#,
        )
        .unwrap();
        assert!(!config.dispatcher.enabled);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_policy = format!("{MINIMAL}\n[dispatcher]\nfailure_policy = \"retry_forever\"\n");
        assert!(AppConfig::from_toml(&bad_policy).is_err());

        let bad_ceiling = format!("{MINIMAL}\n[dispatcher]\nmax_customers = -5\n");
        assert!(AppConfig::from_toml(&bad_ceiling).is_err());

        let bad_bind = format!("{MINIMAL}\n[api]\nbind_address = \"not-an-address\"\n");
        assert!(AppConfig::from_toml(&bad_bind).is_err());

        let same_keys = format!("{MINIMAL}\n[queue]\nqueue_key = \"x\"\ndedup_key = \"x\"\n");
        assert!(AppConfig::from_toml(&same_keys).is_err());
    }

    #[test]
    fn test_load_from_file_with_legacy_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{MINIMAL}\n[dispatcher]\nmax_customers = 10\nmax_wait_seconds = 60\n"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = AppConfig::load_with_env(
            Some(&path),
            env(&[
                ("REDIS_ADDR", "redis-host:6380"),
                ("MAX_AGENTS", "3"),
                ("OMNI_BASE_URL", "https://omni.internal"),
                ("OMNI_API_KEY", "key-1"),
                ("OMNI_API_SECRET", "secret-1"),
                ("PORT", "9000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.queue.url, "redis://redis-host:6380");
        assert_eq!(config.dispatcher.capacity_ceiling(), CapacityCeiling::Limited(3));
        assert_eq!(config.dispatcher.max_wait_seconds, Some(60));
        assert_eq!(config.directory.base_url, "https://omni.internal");
        assert_eq!(config.directory.app_id, "key-1");
        assert_eq!(config.directory.secret_key, "secret-1");
        assert_eq!(config.api.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn test_legacy_max_agents_disabled_and_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{MINIMAL}").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = AppConfig::load_with_env(Some(&path), env(&[("MAX_AGENTS", "-1")])).unwrap();
        assert!(!config.dispatcher.capacity_ceiling().is_enabled());

        let result = AppConfig::load_with_env(Some(&path), env(&[("MAX_AGENTS", "three")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = AppConfig::load_with_env(Some("/nonexistent/allocator.toml"), env(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn test_pop_timeout_defaults_and_rejects_zero() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.dispatcher.pop_timeout_seconds, 1);
        assert_eq!(config.dispatcher.pop_timeout(), std::time::Duration::from_secs(1));

        let zero = format!("{MINIMAL}\n[dispatcher]\npop_timeout_seconds = 0\n");
        assert!(AppConfig::from_toml(&zero).is_err());
    }
}
