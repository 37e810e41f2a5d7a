use redis::{aio::ConnectionManager, aio::MultiplexedConnection, AsyncConnectionConfig, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use allocator_core::{config::QueueConfig, AllocatorError, Result};

/// Redis连接建立器
///
/// 启动时循环执行 `PING` 直到Redis可用，`max_attempts` 为 0 时不限次数。
pub struct RedisConnector {
    client: Client,
    masked_url: String,
    retry_delay: Duration,
    max_attempts: u32,
}

impl RedisConnector {
    pub fn new(config: &QueueConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| AllocatorError::Queue(format!("创建Redis客户端失败: {e}")))?;

        Ok(Self {
            client,
            masked_url: config.masked_url(),
            retry_delay: Duration::from_secs(config.connect_retry_delay_seconds),
            max_attempts: config.connect_max_attempts,
        })
    }

    /// 建立命令连接，带重试
    pub async fn connect(&self) -> Result<ConnectionManager> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            info!("正在连接Redis: {} (第{}次尝试)", self.masked_url, attempt);

            match self.try_connect().await {
                Ok(manager) => {
                    info!("Redis连接成功: {}", self.masked_url);
                    return Ok(manager);
                }
                Err(e) => {
                    if self.max_attempts > 0 && attempt >= self.max_attempts {
                        return Err(AllocatorError::Queue(format!(
                            "连接Redis失败，已尝试{attempt}次: {e}"
                        )));
                    }
                    warn!(
                        "连接Redis失败: {}，{}秒后重试",
                        e,
                        self.retry_delay.as_secs()
                    );
                    sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// 阻塞弹出专用连接，避免 `BLPOP` 占用命令连接
    ///
    /// 默认配置不设响应超时，`BLPOP` 的等待时间由服务端超时参数决定。
    pub async fn blocking_connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .client
            .get_multiplexed_async_connection_with_config(&AsyncConnectionConfig::new())
            .await
            .map_err(|e| AllocatorError::Queue(format!("创建阻塞连接失败: {e}")))?;
        debug!("已创建Redis阻塞弹出连接");
        Ok(conn)
    }

    async fn try_connect(&self) -> Result<ConnectionManager> {
        let mut manager = self
            .client
            .get_connection_manager()
            .await
            .map_err(|e| AllocatorError::Queue(e.to_string()))?;

        ping(&mut manager).await?;
        Ok(manager)
    }
}

/// 执行 `PING` 并检查响应
pub async fn ping(conn: &mut ConnectionManager) -> Result<()> {
    let response: String = redis::cmd("PING")
        .query_async(conn)
        .await
        .map_err(|e| AllocatorError::Queue(format!("Redis PING失败: {e}")))?;

    if response != "PONG" {
        return Err(AllocatorError::Queue(format!(
            "Redis PING响应异常: {response}"
        )));
    }
    Ok(())
}
