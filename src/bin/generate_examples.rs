//! 为所有表情模版生成示例图片，保存到 `<memes_dir>/<key>/example.<ext>`。

use std::path::PathBuf;

use anyhow::{bail, Context as _};
use clap::Parser;
use meme_server::{
    config::{Config, DEFAULT_CONFIG_PATH},
    services::{examples, registry::MemeRegistry},
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "generate-examples", version, about = "生成所有表情模版的示例图片")]
struct Cli {
    /// 作为输入的模板图片
    #[arg(long, default_value = "test_image/avatar.jpg")]
    template: PathBuf,

    /// 示例图片根目录，默认读取配置中的 storage.memes_dir
    #[arg(long)]
    memes_dir: Option<PathBuf>,

    /// 配置文件路径
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 只生成指定的表情，可重复
    #[arg(long = "only")]
    only: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // 模板图片缺失时直接退出，不处理任何表情
    if !cli.template.is_file() {
        bail!("模板图片不存在: {}", cli.template.display());
    }
    let template = std::fs::read(&cli.template)
        .with_context(|| format!("读取模板图片失败: {}", cli.template.display()))?;
    info!("已加载模板图片: {}", cli.template.display());

    let memes_dir = match cli.memes_dir {
        Some(dir) => dir,
        None => {
            let config = Config::load_from_file(&cli.config)?;
            PathBuf::from(&config.storage.memes_dir)
        }
    };

    let registry = MemeRegistry::builtin()?;
    let (memes, unknown) = registry.select(&cli.only);
    for key in &unknown {
        warn!("表情 '{}' 未注册，已跳过", key);
    }
    info!("找到 {} 个表情模版", memes.len());

    let report = examples::generate_all(&memes, &template, &memes_dir);

    println!("\n生成完成!");
    println!("成功: {}/{}", report.success(), report.total());
    println!("失败: {}/{}", report.failed.len(), report.total());
    Ok(())
}
