use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use allocator::common::{parse_app_mode, start_application, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("allocator")
        .version("1.0.0")
        .about("客服会话分配系统")
        .long_about("接收会话分配请求并按容量上限将会话分配给在线坐席")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，未指定时尝试 config/allocator.toml"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("运行模式")
                .value_parser(["dispatcher", "api", "all"])
                .default_value("all"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，未指定时使用配置中的级别")
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

    let mode = parse_app_mode(&string_arg(&matches, "mode").unwrap_or_else(|| "all".to_string()))?;

    let startup_config = StartupConfig {
        config_path: string_arg(&matches, "config"),
        log_level: string_arg(&matches, "log-level"),
        log_format: string_arg(&matches, "log-format").unwrap_or_else(|| "pretty".to_string()),
    };

    start_application(startup_config, mode, "Allocator").await
}

fn string_arg(matches: &ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).cloned()
}
