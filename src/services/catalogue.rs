//! 根据注册表生成表情模板的 markdown 说明文档。

use std::fmt::Write as _;

use crate::models::meme::Meme;
use crate::services::registry::MemeRegistry;

fn input_type(meme: &Meme) -> &'static str {
    let params = &meme.params_type;
    let images = params.min_images > 0 || params.max_images > 0;
    let texts = params.min_texts > 0 || params.max_texts > 0;
    match (images, texts) {
        (true, true) => "图片 + 文本",
        (true, false) => "图片",
        (false, true) => "文本",
        (false, false) => "无",
    }
}

fn or_none(value: String) -> String {
    if value.is_empty() {
        "无".to_string()
    } else {
        value
    }
}

pub fn render_catalogue(registry: &MemeRegistry) -> String {
    let categories = registry.categories();
    let mut doc = String::new();

    let _ = writeln!(doc, "# 表情模板输入要求文档\n");
    let _ = writeln!(doc, "本文档整理了项目中所有表情模板的输入要求。\n");
    let _ = writeln!(doc, "## 统计信息\n");
    let _ = writeln!(doc, "- **总模板数量**: {} 个", categories.all.len());
    let _ = writeln!(doc, "- **仅需图片**: {} 个", categories.image_only.len());
    let _ = writeln!(doc, "- **仅需文本**: {} 个", categories.text_only.len());
    let _ = writeln!(doc, "- **需要图片+文本**: {} 个\n", categories.mixed.len());
    let _ = writeln!(doc, "## 模板列表\n");

    for meme in registry.memes() {
        let params = &meme.params_type;
        let _ = writeln!(doc, "### {}\n", meme.key);
        let _ = writeln!(doc, "**类型**: {}\n", input_type(meme));
        let _ = writeln!(doc, "**关键词**: {}\n", or_none(meme.keywords.join(", ")));
        let _ = writeln!(doc, "**输入要求**:");
        let _ = writeln!(doc, "- 图片数量: {}-{} 张", params.min_images, params.max_images);
        let _ = writeln!(doc, "- 文本数量: {}-{} 个\n", params.min_texts, params.max_texts);
        if !params.default_texts.is_empty() {
            let _ = writeln!(doc, "**默认文本**: {}", params.default_texts.join(", "));
        }
        let _ = writeln!(doc, "\n---\n");
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_summary_and_sections() {
        let registry = MemeRegistry::builtin().unwrap();
        let doc = render_catalogue(&registry);

        assert!(doc.starts_with("# 表情模板输入要求文档"));
        assert!(doc.contains("- **总模板数量**: 8 个"));
        assert!(doc.contains("- **仅需图片**: 3 个"));
        assert!(doc.contains("- **仅需文本**: 2 个"));
        assert!(doc.contains("- **需要图片+文本**: 1 个"));
        assert_eq!(doc.matches("\n### ").count(), 8);
        assert!(doc.contains("### sign\n\n**类型**: 文本"));
        assert!(doc.contains("**默认文本**: 加班, 摸鱼"));
        assert!(doc.contains("### confetti\n\n**类型**: 无"));
    }

    #[test]
    fn test_sections_sorted_by_key() {
        let doc = render_catalogue(&MemeRegistry::builtin().unwrap());
        let caption = doc.find("### caption").unwrap();
        let two_choices = doc.find("### two_choices").unwrap();
        assert!(caption < two_choices);
    }
}
