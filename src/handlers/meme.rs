use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use crate::handlers::form::MemeForm;
use crate::memes::list::{MemeLabel, MemeProperties};
use crate::metrics::REQUEST_COUNTER;
use crate::models::meme::{Meme, MemeCategories, MemeInfoResponse};
use crate::services::meme::MemeService;
use crate::utils::error::{AppError, MemeError, Result};
use crate::utils::sniff::sniff_mime;

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemeKeyWithProperties {
    #[schema(example = "sign")]
    pub meme_key: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub labels: Vec<MemeLabel>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenderMemeListRequest {
    /// 缺省时渲染全部表情（按 key 排序）
    #[serde(default)]
    pub meme_list: Option<Vec<MemeKeyWithProperties>>,
    #[serde(default = "default_text_template")]
    #[schema(example = "{keywords}")]
    pub text_template: String,
    #[serde(default = "default_true")]
    pub add_category_icon: bool,
}

fn default_text_template() -> String {
    "{keywords}".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RenderMemeListRequest {
    fn default() -> Self {
        Self {
            meme_list: None,
            text_template: default_text_template(),
            add_category_icon: true,
        }
    }
}

/// 根据内容的文件头设置 Content-Type
fn image_response(content: Vec<u8>) -> Response {
    let mime_type = sniff_mime(&content);
    ([(header::CONTENT_TYPE, mime_type)], content).into_response()
}

/// 解析表单中的 `args` 字段：缺省或为空时使用参数模型的默认值
fn decode_args_field(meme: &Meme, raw: Option<&str>) -> std::result::Result<Map<String, Value>, MemeError> {
    match raw {
        None | Some("") => Ok(meme.params_type.args_decoder().defaults()),
        Some(raw) => {
            let value: Value = serde_json::from_str(raw)
                .map_err(|e| MemeError::ArgModelMismatch(format!("Invalid JSON in args: {}", e)))?;
            meme.decode_args(&value)
        }
    }
}

/// 生成表情
#[utoipa::path(
    post,
    path = "/memes/{key}/",
    tag = "memes",
    params(("key" = String, Path, description = "表情 key")),
    responses(
        (status = 200, description = "生成的表情图片", content_type = "image/*"),
        (status = 531, description = "表情不存在"),
        (status = 541, description = "图片数量不符"),
        (status = 542, description = "文字数量不符"),
        (status = 552, description = "参数校验失败")
    )
)]
pub async fn generate_meme(
    State(service): State<Arc<MemeService>>,
    Path(key): Path<String>,
    form: MemeForm,
) -> Result<Response> {
    REQUEST_COUNTER.inc();
    let meme = service.get(&key)?;

    let texts: Vec<String> = form
        .texts
        .unwrap_or_else(|| meme.params_type.default_texts.clone())
        .into_iter()
        .filter(|text| !text.is_empty())
        .collect();
    let args = decode_args_field(&meme, form.args.as_deref())?;

    let content = service.generate(meme, form.images, texts, args).await?;
    Ok(image_response(content))
}

/// 把多个表情渲染成列表图
#[utoipa::path(
    post,
    path = "/memes/render_list",
    tag = "memes",
    request_body(content = RenderMemeListRequest, content_type = "application/json", description = "请求体可省略"),
    responses(
        (status = 200, description = "表情列表图片", content_type = "image/png"),
        (status = 422, description = "请求体格式错误"),
        (status = 531, description = "表情不存在")
    )
)]
pub async fn render_list(
    State(service): State<Arc<MemeService>>,
    body: Bytes,
) -> Result<Response> {
    let request: RenderMemeListRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RenderMemeListRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::Validation(e.to_string()))?
    };

    let entries = match request.meme_list {
        Some(list) => list
            .into_iter()
            .map(|item| {
                (
                    item.meme_key,
                    MemeProperties {
                        disabled: item.disabled,
                        labels: item.labels,
                    },
                )
            })
            .collect(),
        None => service
            .registry()
            .keys()
            .into_iter()
            .map(|key| (key, MemeProperties::default()))
            .collect(),
    };

    let content = service
        .render_list(entries, request.text_template, request.add_category_icon)
        .await?;
    Ok(image_response(content))
}

/// 服务版本
#[utoipa::path(
    get,
    path = "/meme/version",
    tag = "memes",
    responses((status = 200, description = "版本号", body = String))
)]
pub async fn version() -> Json<&'static str> {
    Json(env!("CARGO_PKG_VERSION"))
}

/// 所有表情的 key
#[utoipa::path(
    get,
    path = "/memes/keys",
    tag = "memes",
    responses((status = 200, description = "表情 key 列表", body = Vec<String>))
)]
pub async fn list_keys(State(service): State<Arc<MemeService>>) -> Json<Vec<String>> {
    Json(service.registry().keys())
}

/// 表情详细信息
#[utoipa::path(
    get,
    path = "/memes/{key}/info",
    tag = "memes",
    params(("key" = String, Path, description = "表情 key")),
    responses(
        (status = 200, description = "表情信息", body = MemeInfoResponse),
        (status = 531, description = "表情不存在")
    )
)]
pub async fn meme_info(
    State(service): State<Arc<MemeService>>,
    Path(key): Path<String>,
) -> Result<Json<MemeInfoResponse>> {
    let meme = service.get(&key)?;
    Ok(Json(MemeInfoResponse::from(meme.as_ref())))
}

/// 使用默认输入渲染预览
#[utoipa::path(
    get,
    path = "/memes/{key}/preview",
    tag = "memes",
    params(("key" = String, Path, description = "表情 key")),
    responses(
        (status = 200, description = "预览图片", content_type = "image/*"),
        (status = 531, description = "表情不存在")
    )
)]
pub async fn meme_preview(
    State(service): State<Arc<MemeService>>,
    Path(key): Path<String>,
) -> Result<Response> {
    let content = service.preview(&key).await?;
    Ok(image_response(content))
}

/// 获取表情模版的示例图片
#[utoipa::path(
    get,
    path = "/memes/{key}/example",
    tag = "memes",
    params(("key" = String, Path, description = "表情 key")),
    responses(
        (status = 200, description = "示例图片", content_type = "image/*"),
        (status = 404, description = "没有示例图片"),
        (status = 500, description = "读取示例图片失败"),
        (status = 531, description = "表情不存在")
    )
)]
pub async fn meme_example(
    State(service): State<Arc<MemeService>>,
    Path(key): Path<String>,
) -> Result<Response> {
    let (content, mime_type) = service.example(&key).await?;
    debug!(meme = %key, size = content.len(), "返回示例图片");
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, mime_type)], content).into_response())
}

/// 按输入需求对表情进行分类
#[utoipa::path(
    get,
    path = "/memes/categories",
    tag = "memes",
    responses((status = 200, description = "分类结果", body = MemeCategories))
)]
pub async fn categories(State(service): State<Arc<MemeService>>) -> Json<MemeCategories> {
    Json(service.registry().categories())
}

/// 健康检查
#[utoipa::path(
    get,
    path = "/memes/health",
    tag = "monitoring",
    responses((status = 200, description = "服务健康"))
)]
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// 获取Prometheus指标
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "monitoring",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain")
    )
)]
pub async fn get_metrics() -> impl IntoResponse {
    let metrics = crate::metrics::get_metrics();
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], metrics)
}
