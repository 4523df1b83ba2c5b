//! # chaser-shot 命令行入口
//!
//! 连接到开启了远程调试的 Chrome，在新标签页中打开目标 URL，截取整页（或可视区域）并写出 PNG 分块。
//!
//! ## 主要功能
//! - 解析命令行参数并加载配置（默认值 → 配置文件 → 环境变量）
//! - 初始化 tracing 日志
//! - 运行一次截图会话，进度显示在页面标题中
//! - Ctrl-C 中断时依然关闭截图标签页和所有 CDP 连接
//!
//! ## 环境变量
//! - `CHASER_CDP_ENDPOINT`: CDP 端点（默认: ws://localhost:9222）
//! - `CHASER_OUTPUT_DIR`: 输出目录（默认: 当前目录）
//! - `CHASER_LOG_LEVEL`: 日志级别（默认: info，`RUST_LOG` 优先）
//! - `CHASER_CAPTURE__*`: 截图参数，例如 `CHASER_CAPTURE__SETTLE_DELAY_MS`

use anyhow::Context;
use chaser_shot::{
    capture::CaptureMode,
    cdp::{CdpBrowser, CdpBrowserImpl},
    config::Config,
    runner,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Full-page screenshots over the Chrome DevTools Protocol
#[derive(Debug, Parser)]
#[command(name = "chaser-shot", version, about)]
struct Cli {
    /// Page to capture
    url: String,

    /// Capture only the visible viewport
    #[arg(long)]
    visible: bool,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// DevTools endpoint, overrides the configuration
    #[arg(long, value_name = "WS")]
    endpoint: Option<String>,

    /// Output directory, overrides the configuration
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(endpoint) = cli.endpoint {
        config.cdp_endpoint = endpoint;
    }
    if let Some(out) = cli.out {
        config.output_dir = out;
    }
    config.validate()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("chaser-shot v{}", chaser_shot::VERSION);

    let mode = if cli.visible {
        CaptureMode::Visible
    } else {
        CaptureMode::WholePage
    };

    let browser = CdpBrowserImpl::new(config.cdp_endpoint.clone());
    match browser.get_version().await {
        Ok(version) => info!("Connected to {} (protocol {})", version.product, version.protocol_version),
        Err(e) => warn!("Could not read browser version: {}", e),
    }

    let outcome = tokio::select! {
        result = runner::capture_url(&browser, &config, &cli.url, mode) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, closing the capture tab and browser connections");
            None
        }
    };

    if let Err(e) = browser.close().await {
        error!("Failed to close browser connections: {}", e);
    }

    match outcome {
        Some(Ok(shot)) => {
            for path in &shot.paths {
                println!("{}", path.display());
            }
            info!(
                "Saved {}x{} capture as {} file(s)",
                shot.metadata.total_width,
                shot.metadata.total_height,
                shot.paths.len()
            );
            Ok(())
        }
        Some(Err(e)) => Err(e).with_context(|| format!("capturing {}", cli.url)),
        None => anyhow::bail!("interrupted"),
    }
}
