//! 表情包生成服务。
//!
//! HTTP 接口把请求转换成注册表中表情的渲染调用，渲染在 blocking 线程池中执行；
//! 另外提供离线生成示例图片和模板文档的命令行工具（见 `src/bin`）。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{OnResponse, TraceLayer},
};
use tracing::{info, Level, Span};

pub mod config;
pub mod handlers;
pub mod memes;
pub mod metrics;
pub mod models;
pub mod openapi;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::handlers::meme as routes;
use crate::services::meme::MemeService;

#[derive(Clone)]
struct CustomOnResponse;

impl<B> OnResponse<B> for CustomOnResponse {
    fn on_response(self, response: &axum::response::Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        info!(parent: span,
            status = %status,
            latency = ?latency,
            "响应完成"
        );
    }
}

/// 构建完整的应用路由。
///
/// 所有表情共用同一个 `POST /memes/:key/` 处理函数，由注册表按 key 分派。
pub fn create_router(service: Arc<MemeService>, config: &Config) -> Router {
    // 配置 CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let proxy = config.server.proxy.clone();
    let swagger_endpoint = config.swagger.endpoint.clone();

    Router::new()
        .route("/", get(move || async move { axum::response::Redirect::to(&swagger_endpoint) }))
        .route("/meme/version", get(routes::version))
        .route("/memes/keys", get(routes::list_keys))
        .route("/memes/categories", get(routes::categories))
        .route("/memes/health", get(routes::health_check))
        .route("/memes/render_list", post(routes::render_list))
        .route("/memes/:key/", post(routes::generate_meme))
        .route("/memes/:key/info", get(routes::meme_info))
        .route("/memes/:key/preview", get(routes::meme_preview))
        .route("/memes/:key/example", get(routes::meme_example))
        .route("/metrics", get(routes::get_metrics))
        .merge(openapi::create_swagger_ui(&config.swagger))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &axum::http::Request<_>| {
                    let remote_addr = if proxy.enabled {
                        request
                            .headers()
                            .get(&proxy.ip_header)
                            .and_then(|h| h.to_str().ok())
                            .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
                            .unwrap_or_else(|| "unknown".to_string())
                    } else {
                        request
                            .extensions()
                            .get::<ConnectInfo<SocketAddr>>()
                            .map(|ci| ci.0.ip().to_string())
                            .unwrap_or_else(|| "unknown".to_string())
                    };

                    tracing::span!(
                        Level::INFO,
                        "请求",
                        method = %request.method(),
                        uri = %request.uri(),
                        ip = %remote_addr,
                    )
                })
                .on_response(CustomOnResponse),
        )
        .layer(cors)
        .with_state(service)
}
