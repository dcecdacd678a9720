//! 把多个表情渲染成一张列表图。

use std::fmt::Write as _;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::canvas;
use crate::models::meme::{Meme, MemeCategory};
use crate::utils::error::MemeError;

const FONT_SIZE: u32 = 20;
const ROW_HEIGHT: u32 = 36;
const ROWS_PER_COLUMN: usize = 30;
const HEADER_HEIGHT: u32 = 64;
const PADDING: u32 = 20;
const ICON_SIZE: u32 = 24;
const BADGE_WIDTH: u32 = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemeLabel {
    New,
    Hot,
}

impl MemeLabel {
    fn badge(self) -> (&'static str, &'static str) {
        match self {
            MemeLabel::New => ("NEW", "#27ae60"),
            MemeLabel::Hot => ("HOT", "#e74c3c"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemeProperties {
    pub disabled: bool,
    pub labels: Vec<MemeLabel>,
}

/// 替换模板中的 `{key}` `{keywords}` `{shortcuts}` `{tags}`
pub fn format_entry(meme: &Meme, text_template: &str) -> String {
    let shortcuts = meme
        .shortcuts
        .iter()
        .map(|s| s.display())
        .collect::<Vec<_>>()
        .join("/");
    let tags = meme.tags.iter().cloned().collect::<Vec<_>>().join("/");
    text_template
        .replace("{key}", &meme.key)
        .replace("{keywords}", &meme.keywords.join("/"))
        .replace("{shortcuts}", &shortcuts)
        .replace("{tags}", &tags)
}

fn text_width(text: &str) -> u32 {
    text.chars()
        .map(|c| if c.is_ascii() { FONT_SIZE * 3 / 5 } else { FONT_SIZE })
        .sum()
}

fn category_icon(category: Option<MemeCategory>) -> Option<(&'static str, &'static str)> {
    match category? {
        MemeCategory::TextOnly => Some(("文", "#3498db")),
        MemeCategory::ImageOnly => Some(("图", "#2ecc71")),
        MemeCategory::Mixed => Some(("混", "#e67e22")),
    }
}

pub fn render_meme_list(
    items: &[(Arc<Meme>, MemeProperties)],
    text_template: &str,
    add_category_icon: bool,
) -> Result<Vec<u8>, MemeError> {
    let entries: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, (meme, _))| format!("{}. {}", i + 1, format_entry(meme, text_template)))
        .collect();

    let icon_space = if add_category_icon { ICON_SIZE + 8 } else { 0 };
    let mut column_widths = Vec::new();
    for (chunk_index, chunk) in items.chunks(ROWS_PER_COLUMN).enumerate() {
        let width = chunk
            .iter()
            .enumerate()
            .map(|(i, (_, props))| {
                let entry = &entries[chunk_index * ROWS_PER_COLUMN + i];
                icon_space + text_width(entry) + props.labels.len() as u32 * (BADGE_WIDTH + 6)
            })
            .max()
            .unwrap_or(0);
        column_widths.push(width + PADDING);
    }

    let rows = items.len().min(ROWS_PER_COLUMN) as u32;
    let content_width: u32 = column_widths.iter().sum();
    let width = (content_width + PADDING * 2).max(320);
    let height = HEADER_HEIGHT + rows * ROW_HEIGHT + PADDING;

    let mut body = String::new();
    let _ = write!(body, r##"<rect width="{}" height="{}" fill="#fdfdfd"/>"##, width, height);
    body.push_str(&canvas::text_element(
        &format!("表情列表（共 {} 个）", items.len()),
        width / 2,
        HEADER_HEIGHT / 2,
        28,
        "#222222",
    ));

    let mut column_x = PADDING;
    for (chunk_index, chunk) in items.chunks(ROWS_PER_COLUMN).enumerate() {
        for (row, (meme, props)) in chunk.iter().enumerate() {
            let entry = &entries[chunk_index * ROWS_PER_COLUMN + row];
            let row_top = HEADER_HEIGHT + row as u32 * ROW_HEIGHT;
            let center_y = row_top + ROW_HEIGHT / 2;
            let mut x = column_x;

            if add_category_icon {
                if let Some((glyph, color)) = category_icon(meme.params_type.category()) {
                    let _ = write!(
                        body,
                        r#"<rect x="{}" y="{}" width="{s}" height="{s}" rx="5" fill="{}"/>"#,
                        x,
                        center_y - ICON_SIZE / 2,
                        color,
                        s = ICON_SIZE,
                    );
                    body.push_str(&canvas::text_element(glyph, x + ICON_SIZE / 2, center_y, 15, "#ffffff"));
                }
                x += icon_space;
            }

            let (fill, decoration) = if props.disabled {
                ("#aaaaaa", "line-through")
            } else {
                ("#333333", "none")
            };
            let _ = write!(
                body,
                r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" text-decoration="{}" dominant-baseline="middle">{}</text>"#,
                x,
                center_y,
                canvas::FONT_FAMILY,
                FONT_SIZE,
                fill,
                decoration,
                canvas::escape_xml(entry),
            );
            x += text_width(entry) + 6;

            for label in &props.labels {
                let (text, color) = label.badge();
                let _ = write!(
                    body,
                    r#"<rect x="{}" y="{}" width="{}" height="20" rx="4" fill="{}"/>"#,
                    x,
                    center_y - 10,
                    BADGE_WIDTH,
                    color,
                );
                body.push_str(&canvas::text_element(text, x + BADGE_WIDTH / 2, center_y, 13, "#ffffff"));
                x += BADGE_WIDTH + 6;
            }
        }
        column_x += column_widths[chunk_index];
    }

    let frame = canvas::render_svg(&body, width, height)?;
    canvas::encode_png(&DynamicImage::ImageRgba8(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memes;
    use crate::utils::sniff::{sniff, ImageKind};

    fn meme(key: &str) -> Arc<Meme> {
        Arc::new(
            memes::builtin()
                .into_iter()
                .find(|m| m.key == key)
                .unwrap(),
        )
    }

    #[test]
    fn test_format_entry_placeholders() {
        let sign = meme("sign");
        assert_eq!(format_entry(&sign, "{keywords}"), "举牌/sign");
        assert_eq!(format_entry(&sign, "{key}: {shortcuts}"), "sign: 举牌xx");
        assert_eq!(format_entry(&sign, "[{tags}]"), "[text]");
    }

    #[test]
    fn test_render_list_png() {
        let items = vec![
            (meme("sign"), MemeProperties::default()),
            (
                meme("mirror"),
                MemeProperties { disabled: true, labels: vec![MemeLabel::New, MemeLabel::Hot] },
            ),
        ];
        let bytes = render_meme_list(&items, "{keywords}", true).unwrap();
        assert_eq!(sniff(&bytes), Some(ImageKind::Png));
    }

    #[test]
    fn test_render_empty_list() {
        let bytes = render_meme_list(&[], "{keywords}", false).unwrap();
        assert_eq!(sniff(&bytes), Some(ImageKind::Png));
    }
}
