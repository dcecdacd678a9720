use image::DynamicImage;
use time::macros::datetime;

use super::canvas;
use crate::models::meme::{CommandShortcut, Meme, MemeInput};
use crate::utils::error::MemeError;

const MAX_TEXT_CHARS: usize = 32;

fn sign(input: MemeInput<'_>) -> Result<Vec<u8>, MemeError> {
    let text = &input.texts[0];
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(MemeError::TextOverLength(text.clone()));
    }

    let (width, height) = (480u32, 300u32);
    let body = format!(
        r##"<rect width="{w}" height="{h}" fill="#f4e4bc"/><rect x="20" y="20" width="{iw}" height="{ih}" fill="none" stroke="#6b4f2a" stroke-width="8" rx="12"/>{t}"##,
        w = width,
        h = height,
        iw = width - 40,
        ih = height - 40,
        t = canvas::text_element(text, width / 2, height / 2, canvas::fit_font_size(text, width - 60, 64), "#3b2a14"),
    );
    let frame = canvas::render_svg(&body, width, height)?;
    canvas::encode_png(&DynamicImage::ImageRgba8(frame))
}

pub fn meme() -> Meme {
    Meme::builder("sign", sign)
        .texts(1, 1)
        .default_texts(&["今天也要加油"])
        .keywords(&["举牌", "sign"])
        .shortcut(CommandShortcut::new(r"举牌(?P<text>\S+)", &["{text}"], Some("举牌xx")))
        .tags(&["text"])
        .dates(datetime!(2022-08-30 14:00 UTC), datetime!(2024-02-14 07:05 UTC))
        .build()
}
