use image::DynamicImage;
use time::macros::datetime;

use super::canvas;
use crate::models::meme::{Meme, MemeInput};
use crate::utils::error::MemeError;

const MAX_TEXT_CHARS: usize = 24;

fn two_choices(input: MemeInput<'_>) -> Result<Vec<u8>, MemeError> {
    if let Some(text) = input.texts.iter().find(|t| t.chars().count() > MAX_TEXT_CHARS) {
        return Err(MemeError::TextOverLength(text.clone()));
    }

    let (width, height) = (400u32, 360u32);
    let half = height / 2;
    let mut body = String::new();
    for (i, (text, color)) in input.texts.iter().zip(["#e74c3c", "#2ecc71"]).enumerate() {
        let y = i as u32 * half;
        body.push_str(&format!(
            r#"<rect x="0" y="{y}" width="{w}" height="{h}" fill="{c}"/>"#,
            y = y,
            w = width,
            h = half,
            c = color,
        ));
        body.push_str(&canvas::text_element(text, width / 2, y + half / 2, canvas::fit_font_size(text, width - 40, 48), "#ffffff"));
    }
    let frame = canvas::render_svg(&body, width, height)?;
    canvas::encode_png(&DynamicImage::ImageRgba8(frame))
}

pub fn meme() -> Meme {
    Meme::builder("two_choices", two_choices)
        .texts(2, 2)
        .default_texts(&["加班", "摸鱼"])
        .keywords(&["二选一", "two choices"])
        .tags(&["text"])
        .dates(datetime!(2023-02-11 16:30 UTC), datetime!(2023-12-01 10:10 UTC))
        .build()
}
