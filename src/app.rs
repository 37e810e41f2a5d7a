use std::sync::Arc;

use anyhow::{Context, Result};
use allocator_api::create_app;
use allocator_core::{traits::AgentDirectory, AppConfig};
use allocator_dispatcher::{Dispatcher, DispatcherSettings};
use allocator_infrastructure::{BackendFactory, QueueBackends};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info};

/// 应用运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// 仅运行分配器
    Dispatcher,
    /// 仅运行入口服务
    Api,
    /// 运行所有组件
    All,
}

impl AppMode {
    fn runs_dispatcher(&self, config: &AppConfig) -> bool {
        match self {
            AppMode::Dispatcher => true,
            AppMode::Api => false,
            AppMode::All => config.dispatcher.enabled,
        }
    }

    fn runs_api(&self, config: &AppConfig) -> bool {
        match self {
            AppMode::Dispatcher => false,
            AppMode::Api => true,
            AppMode::All => config.api.enabled,
        }
    }
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    backends: QueueBackends,
    /// 只有运行分配器时才创建
    directory: Option<Arc<dyn AgentDirectory>>,
}

impl Application {
    /// 创建新的应用实例
    pub async fn new(config: AppConfig, mode: AppMode) -> Result<Self> {
        info!("初始化应用程序，模式: {:?}", mode);

        let backends = BackendFactory::create_queue(&config.queue)
            .await
            .context("初始化队列后端失败")?;

        let directory = if mode.runs_dispatcher(&config) {
            let directory = BackendFactory::create_directory(&config.directory)
                .context("初始化坐席目录失败")?;
            Some(directory)
        } else {
            None
        };

        info!("应用程序初始化完成");

        Ok(Self {
            config,
            mode,
            backends,
            directory,
        })
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    /// 入口服务与分配器共享的队列后端
    pub fn backends(&self) -> &QueueBackends {
        &self.backends
    }

    /// 启动应用程序
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {:?}", self.mode);

        let result = match self.mode {
            AppMode::Dispatcher => self.run_dispatcher(shutdown_rx).await,
            AppMode::Api => self.run_api(shutdown_rx).await,
            AppMode::All => self.run_all_components(shutdown_rx).await,
        };

        // 唤醒仍阻塞在内存队列上的消费者
        self.backends.close();

        result
    }

    /// 运行分配器
    async fn run_dispatcher(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let directory = self
            .directory
            .clone()
            .ok_or_else(|| anyhow::anyhow!("坐席目录未初始化"))?;

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.backends.queue),
            Arc::clone(&self.backends.dedup_index),
            directory,
            DispatcherSettings::from_config(&self.config.dispatcher, &self.config.directory),
        );

        let settings = dispatcher.settings();
        info!(
            "启动分配器服务，容量上限 {}，轮询间隔 {:?}，最长等待 {:?}，失败策略 {:?}",
            settings.ceiling, settings.poll_interval, settings.max_wait, settings.failure_policy
        );

        dispatcher.run(shutdown_rx).await.context("分配器运行失败")?;

        info!("分配器服务已停止");
        Ok(())
    }

    /// 运行入口服务
    async fn run_api(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动入口服务: {}", self.config.api.bind_address);

        let app = create_app(
            Arc::clone(&self.backends.queue),
            Arc::clone(&self.backends.dedup_index),
        );

        // 创建TCP监听器
        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;

        info!("入口服务启动在 http://{}", self.config.api.bind_address);

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("入口服务收到关闭信号");
            })
            .await
            .context("入口服务运行失败")?;

        info!("入口服务已停止");
        Ok(())
    }

    /// 运行所有组件
    async fn run_all_components(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动所有组件");

        let dispatcher = async {
            if self.mode.runs_dispatcher(&self.config) {
                if let Err(e) = self.run_dispatcher(shutdown_rx.resubscribe()).await {
                    error!("分配器运行失败: {e:#}");
                }
            }
        };

        let api = async {
            if self.mode.runs_api(&self.config) {
                if let Err(e) = self.run_api(shutdown_rx.resubscribe()).await {
                    error!("入口服务运行失败: {e:#}");
                }
            }
        };

        // 等待所有组件完成
        tokio::join!(dispatcher, api);

        info!("所有组件已停止");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocator_testing_utils::AppConfigBuilder;
    use std::time::Duration;

    #[tokio::test]
    async fn test_api_mode_skips_directory() {
        let config = AppConfigBuilder::new().build();
        let app = Application::new(config, AppMode::Api).await.unwrap();

        assert!(app.directory.is_none());
        assert_eq!(app.mode(), AppMode::Api);
    }

    #[tokio::test]
    async fn test_all_mode_stops_on_shutdown() {
        let mut config = AppConfigBuilder::new().build();
        config.api.bind_address = "127.0.0.1:0".to_string();

        let app = Arc::new(Application::new(config, AppMode::All).await.unwrap());
        assert!(app.directory.is_some());

        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
        let runner = Arc::clone(&app);
        let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("应用应在关闭信号后退出")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_dispatcher_mode_exits_when_queue_closed() {
        let config = AppConfigBuilder::new().build();
        let app = Arc::new(Application::new(config, AppMode::Dispatcher).await.unwrap());

        let (_shutdown_tx, shutdown_rx) = broadcast::channel(4);
        let runner = Arc::clone(&app);
        let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        app.backends().close();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("队列关闭后分配器应退出")
            .unwrap();
        assert!(result.is_ok());
    }
}
