//! 内置表情共用的绘制工具：位图合成与编码使用 `image`，文字通过构造 SVG
//! 再由 `resvg` 光栅化。

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::{self, FilterType};
use image::{Delay, DynamicImage, Frame, ImageOutputFormat, Rgba, RgbaImage};
use lazy_static::lazy_static;
use resvg::tiny_skia;

use crate::utils::error::MemeError;

lazy_static! {
    // 系统字体只加载一次
    static ref FONT_DB: Arc<usvg::fontdb::Database> = {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "字体库加载完成");
        Arc::new(db)
    };
}

pub const FONT_FAMILY: &str = "Noto Sans CJK SC, Microsoft YaHei, PingFang SC, DejaVu Sans, sans-serif";

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// 把 SVG 片段渲染成给定尺寸的 RGBA 图层
pub fn render_svg(body: &str, width: u32, height: u32) -> Result<RgbaImage, MemeError> {
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
        w = width,
        h = height,
        body = body,
    );
    let options = usvg::Options {
        fontdb: FONT_DB.clone(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(&svg, &options)
        .map_err(|e| MemeError::Render(format!("parse svg: {}", e)))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| MemeError::Render(format!("invalid canvas size {}x{}", width, height)))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut layer = RgbaImage::new(width, height);
    for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(layer)
}

/// 居中的单行文字
pub fn text_element(text: &str, x: u32, y: u32, size: u32, fill: &str) -> String {
    format!(
        r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" fill="{fill}" text-anchor="middle" dominant-baseline="middle">{text}</text>"#,
        x = x,
        y = y,
        family = FONT_FAMILY,
        size = size,
        fill = fill,
        text = escape_xml(text),
    )
}

/// 按文字长度估算字号，使其大致能放进 `width`
pub fn fit_font_size(text: &str, width: u32, max_size: u32) -> u32 {
    let units: f32 = text
        .chars()
        .map(|c| if c.is_ascii() { 0.6 } else { 1.0 })
        .sum();
    if units <= 0.0 {
        return max_size;
    }
    let size = (width as f32 * 0.9 / units) as u32;
    size.clamp(12u32.min(max_size), max_size)
}

/// 预览和示例生成时使用的固定头像
pub fn placeholder_avatar() -> DynamicImage {
    let size = 200u32;
    let img = RgbaImage::from_fn(size, size, |x, y| {
        let r = (x * 255 / size) as u8;
        let g = (y * 255 / size) as u8;
        let dx = x as i32 - 100;
        let dy = y as i32 - 100;
        let b = if dx * dx + dy * dy < 60 * 60 { 230 } else { 90 };
        Rgba([r, g, b, 255])
    });
    DynamicImage::ImageRgba8(img)
}

pub fn square(img: &DynamicImage, size: u32) -> RgbaImage {
    img.resize_to_fill(size, size, FilterType::Triangle).to_rgba8()
}

pub fn fit_width(img: &DynamicImage, width: u32) -> RgbaImage {
    let height = ((img.height() as u64 * width as u64) / img.width().max(1) as u64).max(1) as u32;
    imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle)
}

pub fn filled(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, MemeError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png)?;
    Ok(buf.into_inner())
}

pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, MemeError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageOutputFormat::Jpeg(quality))?;
    Ok(buf.into_inner())
}

pub fn encode_gif(frames: Vec<RgbaImage>, delay_ms: u32) -> Result<Vec<u8>, MemeError> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames.into_iter().map(|frame| {
            Frame::from_parts(frame, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
        }))?;
    }
    Ok(buf)
}
