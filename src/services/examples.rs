//! 示例图片的磁盘布局：`<memes_dir>/<key>/example.<ext>`。
//! 接口读取与离线生成脚本共用这里的约定。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::models::meme::Meme;
use crate::utils::error::{AppError, Result};
use crate::utils::sniff;

/// 查找顺序即优先级
pub const EXAMPLE_EXTENSIONS: [&str; 4] = ["gif", "jpg", "jpeg", "png"];

pub fn meme_dir(root: &Path, key: &str) -> PathBuf {
    root.join(key)
}

pub fn example_candidates(root: &Path, key: &str) -> Vec<PathBuf> {
    let dir = meme_dir(root, key);
    EXAMPLE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("example.{}", ext)))
        .collect()
}

/// 按优先级查找第一个存在的示例图片；无法确认是否存在时返回错误而不是当作缺失
pub async fn find_example(root: &Path, key: &str) -> Result<Option<PathBuf>> {
    for path in example_candidates(root, key) {
        let exists = tokio::fs::try_exists(&path).await.map_err(|e| {
            error!(path = %path.display(), "检查示例图片失败: {}", e);
            AppError::Internal(format!("读取示例图片失败: {}", e))
        })?;
        if exists {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// 读取示例图片并返回内容与媒体类型；调用方负责先确认 key 已注册
pub async fn read_example(root: &Path, key: &str) -> Result<(Vec<u8>, String)> {
    let path = find_example(root, key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("表情模版 '{}' 没有找到示例图片", key)))?;

    let content = tokio::fs::read(&path).await.map_err(|e| {
        error!(path = %path.display(), "读取示例图片失败: {}", e);
        AppError::Internal(format!("读取示例图片失败: {}", e))
    })?;

    let mime_type = match mime_guess::from_path(&path).first() {
        Some(mime) if mime.type_() == mime_guess::mime::IMAGE => mime.to_string(),
        _ => sniff::sniff(&content)
            .map(|kind| kind.mime().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    };
    debug!(path = %path.display(), mime_type = %mime_type, "返回示例图片");
    Ok((content, mime_type))
}

/// 写入示例图片，同时删除其他扩展名的旧文件，避免查找时命中过期的图片
pub fn write_example(root: &Path, key: &str, content: &[u8]) -> std::io::Result<PathBuf> {
    let dir = meme_dir(root, key);
    std::fs::create_dir_all(&dir)?;

    let ext = sniff::example_extension(content);
    let target = dir.join(format!("example.{}", ext));
    for stale in example_candidates(root, key) {
        if stale != target && stale.exists() {
            std::fs::remove_file(&stale)?;
        }
    }
    std::fs::write(&target, content)?;
    Ok(target)
}

/// 生成示例时使用的文字：有默认文字用默认文字，否则按最少文字数填充占位文字
pub fn example_texts(meme: &Meme) -> Vec<String> {
    let params = &meme.params_type;
    if !params.default_texts.is_empty() {
        params.default_texts.clone()
    } else {
        (1..=params.min_texts).map(|i| format!("示例文字{}", i)).collect()
    }
}

/// 用模板图片（重复最少图片数次）、示例文字和示例参数渲染并写入一个表情的示例图片
pub fn generate_example(meme: &Meme, template: &[u8], root: &Path) -> Result<PathBuf> {
    let images = vec![template.to_vec(); meme.params_type.min_images as usize];
    let args = Value::Object(meme.params_type.example_args());
    let content = meme.generate(images, example_texts(meme), &args)?;
    Ok(write_example(root, &meme.key, &content)?)
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<(String, PathBuf)>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn success(&self) -> usize {
        self.written.len()
    }

    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// 逐个生成示例图片，单个表情失败只记录，不中断整批
pub fn generate_all(memes: &[Arc<Meme>], template: &[u8], root: &Path) -> BatchReport {
    let mut report = BatchReport::default();
    for meme in memes {
        info!("正在生成 {} 的示例图片...", meme.key);
        match generate_example(meme, template, root) {
            Ok(path) => {
                info!("✓ {} 示例图片已保存到: {}", meme.key, path.display());
                report.written.push((meme.key.clone(), path));
            }
            Err(e) => {
                error!("✗ 生成 {} 示例图片失败: {}", meme.key, e);
                report.failed.push((meme.key.clone(), e.to_string()));
            }
        }
    }
    report
}
