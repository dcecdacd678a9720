//! 根据注册表生成表情模板输入要求文档。

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use meme_server::services::{catalogue, registry::MemeRegistry};

#[derive(Parser, Debug)]
#[command(name = "generate-catalogue", version, about = "生成表情模板 markdown 文档")]
struct Cli {
    /// 输出文件
    #[arg(long, default_value = "template.md")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let registry = MemeRegistry::builtin()?;
    let categories = registry.categories();

    let doc = catalogue::render_catalogue(&registry);
    std::fs::write(&cli.output, doc)
        .with_context(|| format!("写入 {} 失败", cli.output.display()))?;

    println!(
        "已生成 {} 文件，包含 {} 个模板",
        cli.output.display(),
        categories.all.len()
    );
    println!(
        "统计: 仅图片 {} 个, 仅文本 {} 个, 混合 {} 个",
        categories.image_only.len(),
        categories.text_only.len(),
        categories.mixed.len()
    );
    Ok(())
}
