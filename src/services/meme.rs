use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::memes::list::{render_meme_list, MemeProperties};
use crate::metrics::{RENDER_FAILURES, RENDER_TIME};
use crate::models::meme::Meme;
use crate::services::{examples, registry::MemeRegistry};
use crate::utils::error::{AppError, MemeError, Result};

/// 表情服务：在注册表上查找表情，并把阻塞的渲染调用放到线程池中执行
#[derive(Debug)]
pub struct MemeService {
    registry: Arc<MemeRegistry>,
    memes_dir: PathBuf,
}

impl MemeService {
    pub fn new(registry: Arc<MemeRegistry>, memes_dir: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            registry,
            memes_dir: memes_dir.into(),
        })
    }

    pub fn registry(&self) -> &MemeRegistry {
        &self.registry
    }

    pub fn memes_dir(&self) -> &Path {
        &self.memes_dir
    }

    pub fn get(&self, key: &str) -> Result<Arc<Meme>> {
        Ok(self.registry.get(key)?)
    }

    pub async fn generate(
        &self,
        meme: Arc<Meme>,
        images: Vec<Vec<u8>>,
        texts: Vec<String>,
        args: Map<String, Value>,
    ) -> Result<Vec<u8>> {
        let key = meme.key.clone();
        info!(
            meme = %key,
            images = images.len(),
            texts = texts.len(),
            "开始生成表情"
        );
        run_blocking(&key, move || meme.generate(images, texts, &Value::Object(args))).await
    }

    pub async fn preview(&self, key: &str) -> Result<Vec<u8>> {
        let meme = self.get(key)?;
        run_blocking(key, move || meme.generate_preview()).await
    }

    pub async fn render_list(
        &self,
        entries: Vec<(String, MemeProperties)>,
        text_template: String,
        add_category_icon: bool,
    ) -> Result<Vec<u8>> {
        let items = entries
            .into_iter()
            .map(|(key, props)| Ok((self.registry.get(&key)?, props)))
            .collect::<std::result::Result<Vec<_>, MemeError>>()?;

        run_blocking("render_list", move || {
            render_meme_list(&items, &text_template, add_category_icon)
        })
        .await
    }

    pub async fn example(&self, key: &str) -> Result<(Vec<u8>, String)> {
        self.get(key)?;
        examples::read_example(&self.memes_dir, key).await
    }
}

/// 渲染是 CPU 密集的同步操作，放到 blocking 线程池中执行，避免阻塞事件循环
async fn run_blocking<F>(label: &str, f: F) -> Result<Vec<u8>>
where
    F: FnOnce() -> std::result::Result<Vec<u8>, MemeError> + Send + 'static,
{
    let _timer = crate::metrics::Timer::new(&RENDER_TIME);
    let start = Instant::now();

    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("渲染任务异常退出: {}", e)))?;

    match result {
        Ok(content) => {
            info!(
                meme = %label,
                bytes = content.len(),
                elapsed = ?start.elapsed(),
                "表情生成完成"
            );
            Ok(content)
        }
        Err(e) => {
            RENDER_FAILURES.inc();
            warn!(meme = %label, status = e.status_code(), "表情生成失败: {}", e);
            Err(e.into())
        }
    }
}
