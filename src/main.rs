use std::net::SocketAddr;
use std::sync::Arc;

use meme_server::{
    config::{Config, LoggingConfig},
    create_router, metrics,
    services::{meme::MemeService, registry::MemeRegistry},
    utils::error::AppError,
};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 文件日志按天滚动，同时输出到终端；级别由 `LOG_LEVEL` 控制
fn init_logging(logging: &LoggingConfig) -> Result<(), AppError> {
    std::fs::create_dir_all(&logging.directory)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&logging.file_prefix)
        .filename_suffix("log")
        .build(&logging.directory)
        .map_err(|e| AppError::Config(format!("创建日志文件失败: {}", e)))?;

    let filter = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    metrics::init_metrics();

    let config = Config::load_from_file(Config::path_from_env())?;
    init_logging(&config.logging)?;
    tracing::info!("配置加载完成");

    // 注册表在启动时构建，之后只读
    let registry = Arc::new(MemeRegistry::builtin()?);
    metrics::TOTAL_MEMES.set(registry.len() as f64);
    let service = MemeService::new(registry, &config.storage.memes_dir);
    tracing::info!(
        "已加载 {} 个表情，示例图片目录: {}",
        service.registry().len(),
        service.memes_dir().display()
    );

    let app = create_router(service, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| AppError::Config(format!("监听地址无效: {}", e)))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("meme-server 监听 {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
