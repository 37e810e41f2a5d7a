use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use allocator_core::AppConfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::{AppMode, Application};
use crate::shutdown::ShutdownManager;

/// 关闭时等待各组件退出的最长时间
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// 通用的应用启动配置
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// 未指定时尝试默认路径，不存在则只使用环境变量
    pub config_path: Option<String>,
    /// 命令行覆盖的日志级别，未指定时使用配置中的级别
    pub log_level: Option<String>,
    pub log_format: String,
}

/// 初始化日志系统
pub fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 加载应用配置
///
/// 先读取 `.env`，再按 文件 -> `ALLOCATOR__*` -> 旧环境变量 的顺序合并。
pub fn load_config(startup_config: &StartupConfig) -> Result<AppConfig> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    let path = startup_config.config_path.as_deref();
    AppConfig::load(path).with_context(|| match path {
        Some(path) => format!("加载配置文件失败: {path}"),
        None => "加载配置失败".to_string(),
    })
}

/// 初始化Prometheus指标导出
pub fn init_metrics(config: &AppConfig) -> Result<()> {
    if !config.observability.metrics_enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .observability
        .metrics_bind_address
        .parse()
        .with_context(|| {
            format!(
                "无效的指标监听地址: {}",
                config.observability.metrics_bind_address
            )
        })?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("初始化Prometheus指标导出失败")?;

    info!("Prometheus指标导出已启动: http://{addr}/metrics");
    Ok(())
}

/// 启动应用程序的通用函数
pub async fn start_application(
    startup_config: StartupConfig,
    app_mode: AppMode,
    service_name: &str,
) -> Result<()> {
    // 加载配置
    let config = load_config(&startup_config)?;

    // 初始化日志系统
    let log_level = startup_config
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    init_logging(log_level, &startup_config.log_format)?;

    info!("启动 {} 服务", service_name);
    if let Some(ref path) = startup_config.config_path {
        info!("配置文件: {}", path);
    }
    info!("运行模式: {:?}", app_mode);
    info!(
        "队列后端: {:?}，地址 {}",
        config.queue.backend,
        config.queue.masked_url()
    );

    // 验证模式是否被启用
    validate_mode_enabled(&app_mode, &config)?;

    init_metrics(&config)?;

    // 创建应用实例
    let app = Application::new(config, app_mode).await?;

    // 创建优雅关闭管理器
    let shutdown_manager = ShutdownManager::new();

    // 启动应用
    let app_handle = {
        let app = Arc::new(app);
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app_clone = Arc::clone(&app);
        let shutdown_clone = shutdown_manager.clone();

        tokio::spawn(async move {
            if let Err(e) = app_clone.run(shutdown_rx).await {
                error!("应用运行失败: {e:#}");
            }
            // 组件自行退出时同样结束主流程
            shutdown_clone.shutdown().await;
        })
    };

    let mut finished_rx = shutdown_manager.subscribe().await;

    // 等待关闭信号或应用自行退出
    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            info!("收到关闭信号，开始优雅关闭...");
        }
        _ = finished_rx.recv() => {
            info!("应用组件已退出");
        }
    }

    // 触发关闭
    shutdown_manager.shutdown().await;

    // 等待应用关闭，设置超时
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, app_handle).await {
        Ok(result) => {
            if let Err(e) = result {
                error!("应用关闭时发生错误: {e}");
            } else {
                info!("{} 服务已优雅关闭", service_name);
            }
        }
        Err(_) => {
            warn!("{} 服务关闭超时，强制退出", service_name);
        }
    }

    info!("{} 服务已退出", service_name);
    Ok(())
}

/// 验证指定的模式是否在配置中被启用
pub fn validate_mode_enabled(app_mode: &AppMode, config: &AppConfig) -> Result<()> {
    match app_mode {
        AppMode::Dispatcher => {
            if !config.dispatcher.enabled {
                return Err(anyhow::anyhow!("Dispatcher模式被禁用，请检查配置"));
            }
        }
        AppMode::Api => {
            if !config.api.enabled {
                return Err(anyhow::anyhow!("API模式被禁用，请检查配置"));
            }
        }
        AppMode::All => {
            // All模式下，至少需要启用一个组件
            if !config.dispatcher.enabled && !config.api.enabled {
                return Err(anyhow::anyhow!("所有组件都被禁用，请检查配置"));
            }
        }
    }
    Ok(())
}

/// 解析应用运行模式
pub fn parse_app_mode(mode_str: &str) -> Result<AppMode> {
    match mode_str {
        "dispatcher" => Ok(AppMode::Dispatcher),
        "api" => Ok(AppMode::Api),
        "all" => Ok(AppMode::All),
        _ => Err(anyhow::anyhow!("无效的运行模式: {mode_str}")),
    }
}

/// 等待关闭信号
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_mode() {
        assert_eq!(parse_app_mode("dispatcher").unwrap(), AppMode::Dispatcher);
        assert_eq!(parse_app_mode("api").unwrap(), AppMode::Api);
        assert_eq!(parse_app_mode("all").unwrap(), AppMode::All);
        assert!(parse_app_mode("worker").is_err());
    }

    #[test]
    fn test_validate_mode_enabled() {
        let mut config = AppConfig::default();
        config.dispatcher.enabled = false;

        assert!(validate_mode_enabled(&AppMode::Dispatcher, &config).is_err());
        assert!(validate_mode_enabled(&AppMode::Api, &config).is_ok());
        assert!(validate_mode_enabled(&AppMode::All, &config).is_ok());

        config.api.enabled = false;
        assert!(validate_mode_enabled(&AppMode::All, &config).is_err());
    }

    #[test]
    fn test_init_metrics_disabled_is_noop() {
        let config = AppConfig::default();
        assert!(init_metrics(&config).is_ok());
    }
}
