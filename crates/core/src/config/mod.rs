//! 配置管理
//!
//! 配置按以下顺序合并，后者覆盖前者：内置默认值、TOML配置文件、
//! `ALLOCATOR__` 前缀的环境变量、旧部署使用的扁平环境变量。

pub mod models;

pub use models::{
    mask_url_password, ApiConfig, AppConfig, DirectoryConfig, DispatcherConfig,
    FailurePolicyKind, ObservabilityConfig, QueueBackend, QueueConfig,
};
pub use models::app_config::{DEFAULT_CONFIG_PATH, ENV_PREFIX};
