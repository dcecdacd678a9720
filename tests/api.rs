//! HTTP 接口集成测试。
//!
//! 通过 `tower::ServiceExt::oneshot` 在进程内调用路由，使用内置注册表和
//! 临时的示例图片目录。

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use meme_server::{
    config::Config,
    create_router,
    memes::canvas::{encode_png, placeholder_avatar},
    services::{meme::MemeService, registry::MemeRegistry},
};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "----meme-test-boundary";

struct TestApp {
    router: Router,
    memes_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.memes_dir).ok();
    }
}

fn test_app() -> TestApp {
    let memes_dir = std::env::temp_dir().join(format!("meme-api-{}", fastrand::u64(..)));
    std::fs::create_dir_all(&memes_dir).unwrap();
    let registry = Arc::new(MemeRegistry::builtin().unwrap());
    let service = MemeService::new(registry, &memes_dir);
    TestApp {
        router: create_router(service, &Config::default()),
        memes_dir,
    }
}

struct TestResponse {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse { status, content_type, body }
}

async fn get(app: &TestApp, uri: &str) -> TestResponse {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

enum Part<'a> {
    Image(&'a [u8]),
    Field(&'a str, &'a str),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Image(bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"images\"; filename=\"{}.png\"\r\nContent-Type: image/png\r\n\r\n",
                        i
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Field(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_multipart(app: &TestApp, uri: &str, parts: &[Part<'_>]) -> TestResponse {
    let request = Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

async fn post_json(app: &TestApp, uri: &str, json: &str) -> TestResponse {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    send(app, request).await
}

fn avatar() -> Vec<u8> {
    encode_png(&placeholder_avatar()).unwrap()
}

fn is_image(content_type: &str) -> bool {
    matches!(content_type, "image/gif" | "image/png" | "image/jpeg")
}

// ============================================================================
// 基础接口
// ============================================================================

#[tokio::test]
async fn test_version() {
    let app = test_app();
    let resp = get(&app, "/meme/version").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), Value::String(env!("CARGO_PKG_VERSION").to_string()));
}

#[tokio::test]
async fn test_keys_lists_every_meme() {
    let app = test_app();
    let resp = get(&app, "/memes/keys").await;
    assert_eq!(resp.status, StatusCode::OK);
    let keys: Vec<String> = serde_json::from_slice(&resp.body).unwrap();
    assert_eq!(
        keys,
        ["caption", "confetti", "grayscale", "mirror", "side_by_side", "sign", "spin", "two_choices"]
    );
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = test_app();
    assert_eq!(get(&app, "/memes/health").await.status, StatusCode::OK);
    let resp = get(&app, "/metrics").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.content_type.starts_with("text/plain"));
}

// ============================================================================
// 表情信息与分类
// ============================================================================

#[tokio::test]
async fn test_info_shape() {
    let app = test_app();
    let resp = get(&app, "/memes/spin/info").await;
    assert_eq!(resp.status, StatusCode::OK);
    let info = resp.json();
    assert_eq!(info["key"], "spin");
    assert_eq!(info["params_type"]["min_images"], 1);
    assert_eq!(info["params_type"]["max_images"], 1);
    assert_eq!(info["params_type"]["max_texts"], 0);
    let args_type = &info["params_type"]["args_type"];
    assert_eq!(args_type["args_model"]["properties"]["frame_delay"]["type"], "integer");
    assert_eq!(args_type["args_examples"][0]["frame_delay"], 100);
    assert!(args_type["parser_options"].as_array().unwrap().len() >= 1);
    assert!(info["keywords"].as_array().unwrap().contains(&Value::from("转圈")));
    assert!(info["date_created"].as_str().unwrap().starts_with("2023-04-01T08:00:00"));
    assert!(info["date_modified"].is_string());
    assert!(info["tags"].is_array());
}

#[tokio::test]
async fn test_info_without_args_type() {
    let app = test_app();
    let info = get(&app, "/memes/side_by_side/info").await.json();
    assert!(info["params_type"]["args_type"].is_null());
    assert_eq!(info["params_type"]["default_texts"], Value::Array(vec![]));
}

#[tokio::test]
async fn test_info_bounds_are_enforced() {
    let app = test_app();
    let info = get(&app, "/memes/side_by_side/info").await.json();
    assert_eq!(info["params_type"]["min_images"], 2);

    let image = avatar();
    let resp = post_multipart(&app, "/memes/side_by_side/", &[Part::Image(&image)]).await;
    assert_eq!(resp.status.as_u16(), 541);
    assert!(!resp.json()["detail"].as_str().unwrap().is_empty());

    let resp = post_multipart(
        &app,
        "/memes/side_by_side/",
        &[Part::Image(&image), Part::Image(&image)],
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.content_type, "image/png");
}

#[tokio::test]
async fn test_categories_partition() {
    let app = test_app();
    let resp = get(&app, "/memes/categories").await;
    assert_eq!(resp.status, StatusCode::OK);
    let categories = resp.json();
    let bucket = |name: &str| -> Vec<String> {
        serde_json::from_value(categories[name].clone()).unwrap()
    };
    let all = bucket("all");
    let text_only = bucket("text_only");
    let image_only = bucket("image_only");
    let mixed = bucket("mixed");

    for key in text_only.iter().chain(&image_only).chain(&mixed) {
        assert!(all.contains(key), "{} missing from all", key);
    }
    for key in &text_only {
        assert!(!image_only.contains(key) && !mixed.contains(key));
    }
    for key in &image_only {
        assert!(!mixed.contains(key));
    }

    // 0 张图片，2 段文字
    assert!(text_only.contains(&"two_choices".to_string()));
    assert!(!image_only.contains(&"two_choices".to_string()));
    assert!(!mixed.contains(&"two_choices".to_string()));

    // 不需要任何输入：只出现在 all 中
    let confetti = "confetti".to_string();
    assert!(all.contains(&confetti));
    assert!(!text_only.contains(&confetti) && !image_only.contains(&confetti) && !mixed.contains(&confetti));
}

// ============================================================================
// 表情生成
// ============================================================================

#[tokio::test]
async fn test_every_meme_renders_with_advertised_inputs() {
    let app = test_app();
    let image = avatar();
    let keys: Vec<String> = serde_json::from_slice(&get(&app, "/memes/keys").await.body).unwrap();

    for key in keys {
        let info = get(&app, &format!("/memes/{}/info", key)).await.json();
        let params = &info["params_type"];
        let min_images = params["min_images"].as_u64().unwrap() as usize;
        let min_texts = params["min_texts"].as_u64().unwrap() as usize;
        let mut texts: Vec<String> =
            serde_json::from_value(params["default_texts"].clone()).unwrap();
        if texts.is_empty() {
            texts = vec![key.clone(); min_texts];
        }
        let args = match params["args_type"]["args_examples"].get(0) {
            Some(example) => example.to_string(),
            None => "{}".to_string(),
        };

        let mut parts: Vec<Part<'_>> = (0..min_images).map(|_| Part::Image(&image)).collect();
        for text in &texts {
            parts.push(Part::Field("texts", text));
        }
        parts.push(Part::Field("args", &args));

        let resp = post_multipart(&app, &format!("/memes/{}/", key), &parts).await;
        assert_eq!(resp.status, StatusCode::OK, "{} failed: {:?}", key, String::from_utf8_lossy(&resp.body));
        assert!(is_image(&resp.content_type), "{} returned {}", key, resp.content_type);
    }
}

#[tokio::test]
async fn test_default_texts_used_when_none_given() {
    let app = test_app();
    let resp = post_multipart(&app, "/memes/two_choices/", &[]).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.content_type, "image/png");
}

#[tokio::test]
async fn test_empty_texts_are_dropped_before_counting() {
    let app = test_app();
    let resp = post_multipart(
        &app,
        "/memes/two_choices/",
        &[Part::Field("texts", "yes"), Part::Field("texts", "")],
    )
    .await;
    assert_eq!(resp.status.as_u16(), 542);
}

#[tokio::test]
async fn test_texts_from_query_and_urlencoded_body() {
    let app = test_app();
    let request = Request::post("/memes/two_choices/?texts=left")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("texts=right"))
        .unwrap();
    let resp = send(&app, request).await;
    assert_eq!(resp.status, StatusCode::OK);

    let request = Request::post("/memes/sign/?texts=a&texts=b")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, request).await;
    assert_eq!(resp.status.as_u16(), 542);
}

#[tokio::test]
async fn test_text_over_length() {
    let app = test_app();
    let long = "长".repeat(40);
    let resp = post_multipart(&app, "/memes/sign/", &[Part::Field("texts", &long)]).await;
    assert_eq!(resp.status.as_u16(), 532);
}

#[tokio::test]
async fn test_malformed_args_json() {
    let app = test_app();
    let image = avatar();
    let resp = post_multipart(
        &app,
        "/memes/spin/",
        &[Part::Image(&image), Part::Field("args", "{not json")],
    )
    .await;
    assert_eq!(resp.status.as_u16(), 552);
    assert!(!resp.json()["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_args_validation_failure() {
    let app = test_app();
    let image = avatar();
    let resp = post_multipart(
        &app,
        "/memes/spin/",
        &[Part::Image(&image), Part::Field("args", r#"{"frame_delay": 5000}"#)],
    )
    .await;
    assert_eq!(resp.status.as_u16(), 552);
    let detail = resp.json()["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("frame_delay"));
}

#[tokio::test]
async fn test_broken_image_upload() {
    let app = test_app();
    let resp = post_multipart(&app, "/memes/mirror/", &[Part::Image(b"not an image")]).await;
    assert_eq!(resp.status.as_u16(), 533);
}

#[tokio::test]
async fn test_generate_unknown_key() {
    let app = test_app();
    let resp = post_multipart(&app, "/memes/nope/", &[]).await;
    assert_eq!(resp.status.as_u16(), 531);
}

// ============================================================================
// 预览与示例图片
// ============================================================================

#[tokio::test]
async fn test_preview_is_idempotent() {
    let app = test_app();
    let first = get(&app, "/memes/mirror/preview").await;
    let second = get(&app, "/memes/mirror/preview").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.content_type, "image/png");
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_example_missing_then_present() {
    let app = test_app();
    let resp = get(&app, "/memes/sign/example").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let png = avatar();
    let dir = app.memes_dir.join("sign");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("example.png"), &png).unwrap();

    let resp = get(&app, "/memes/sign/example").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.content_type, "image/png");
    assert_eq!(resp.body, png);
}

#[tokio::test]
async fn test_unreadable_example_is_server_error() {
    let app = test_app();
    // 同名目录占用了示例图片路径：能找到，但读取失败
    std::fs::create_dir_all(app.memes_dir.join("sign").join("example.gif")).unwrap();

    let resp = get(&app, "/memes/sign/example").await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.json()["detail"].as_str().unwrap().starts_with("读取示例图片失败"));
}

#[tokio::test]
async fn test_unknown_key_is_uniform() {
    let app = test_app();
    for route in ["info", "preview", "example"] {
        let resp = get(&app, &format!("/memes/does_not_exist/{}", route)).await;
        assert_eq!(resp.status.as_u16(), 531, "route {}", route);
        assert_eq!(
            resp.json()["detail"],
            "No such meme with key=\"does_not_exist\""
        );
    }
}

// ============================================================================
// 表情列表
// ============================================================================

#[tokio::test]
async fn test_render_list_defaults() {
    let app = test_app();
    let request = Request::post("/memes/render_list").body(Body::empty()).unwrap();
    let resp = send(&app, request).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.content_type, "image/png");
}

#[tokio::test]
async fn test_render_list_with_properties() {
    let app = test_app();
    let resp = post_json(
        &app,
        "/memes/render_list",
        r#"{"meme_list": [{"meme_key": "sign", "labels": ["new"]}, {"meme_key": "spin", "disabled": true}], "text_template": "{key}", "add_category_icon": false}"#,
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.content_type, "image/png");
}

#[tokio::test]
async fn test_render_list_unknown_key() {
    let app = test_app();
    let resp = post_json(&app, "/memes/render_list", r#"{"meme_list": [{"meme_key": "nope"}]}"#).await;
    assert_eq!(resp.status.as_u16(), 531);
}

#[tokio::test]
async fn test_render_list_bad_label() {
    let app = test_app();
    let resp = post_json(
        &app,
        "/memes/render_list",
        r#"{"meme_list": [{"meme_key": "sign", "labels": ["cold"]}]}"#,
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
}
