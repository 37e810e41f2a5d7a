use anyhow::Result;
use clap::{Arg, Command};
use allocator::app::AppMode;
use allocator::common::{start_application, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("allocator-api")
        .version("1.0.0")
        .about("客服会话分配系统 - 入口服务")
        .long_about("接收会话分配Webhook并写入工作队列")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"])
                .default_value("pretty"),
        )
        .get_matches();

    // 创建启动配置
    let startup_config = StartupConfig {
        config_path: matches.get_one::<String>("config").cloned(),
        log_level: matches.get_one::<String>("log-level").cloned(),
        log_format: matches
            .get_one::<String>("log-format")
            .cloned()
            .unwrap_or_else(|| "pretty".to_string()),
    };

    // 启动应用程序
    start_application(startup_config, AppMode::Api, "API").await
}
