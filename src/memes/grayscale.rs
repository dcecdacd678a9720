use image::{imageops, DynamicImage};
use time::macros::datetime;

use super::canvas;
use crate::models::meme::{Meme, MemeInput};
use crate::utils::error::MemeError;

const MAX_TEXT_CHARS: usize = 20;

fn grayscale(input: MemeInput<'_>) -> Result<Vec<u8>, MemeError> {
    let gray = DynamicImage::ImageLuma8(input.images[0].to_luma8());
    let mut frame = canvas::fit_width(&gray, 300);

    // 文字可选
    if let Some(text) = input.texts.first() {
        if text.chars().count() > MAX_TEXT_CHARS {
            return Err(MemeError::TextOverLength(text.clone()));
        }
        let (width, height) = frame.dimensions();
        let band = (height / 5).max(24).min(height);
        let body = format!(
            r#"<rect x="0" y="0" width="{w}" height="{b}" fill="black" fill-opacity="0.5"/>{t}"#,
            w = width,
            b = band,
            t = canvas::text_element(text, width / 2, band / 2, canvas::fit_font_size(text, width, band * 2 / 3), "#ffffff"),
        );
        let label = canvas::render_svg(&body, width, band)?;
        imageops::overlay(&mut frame, &label, 0, (height - band) as i64);
    }

    canvas::encode_png(&DynamicImage::ImageRgba8(frame))
}

pub fn meme() -> Meme {
    Meme::builder("grayscale", grayscale)
        .images(1, 1)
        .texts(0, 1)
        .keywords(&["黑白", "grayscale"])
        .tags(&["filter"])
        .dates(datetime!(2023-01-15 09:00 UTC), datetime!(2023-09-02 11:20 UTC))
        .build()
}
