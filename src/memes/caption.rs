use image::{imageops, DynamicImage};
use serde::Deserialize;
use serde_json::json;
use time::macros::datetime;

use super::{canvas, example, parse_args};
use crate::models::args::{ArgField, ArgsModel};
use crate::models::meme::{Meme, MemeInput, ParserOption};
use crate::utils::error::MemeError;

const WIDTH: u32 = 400;
const BAND: u32 = 80;

#[derive(Deserialize)]
struct CaptionArgs {
    position: String,
    color: String,
}

fn caption(input: MemeInput<'_>) -> Result<Vec<u8>, MemeError> {
    let args: CaptionArgs = parse_args(input.args)?;
    let text = &input.texts[0];
    let picture = canvas::fit_width(&input.images[0], WIDTH);
    let height = picture.height() + BAND;

    let (picture_y, band_y) = match args.position.as_str() {
        "top" => (BAND, 0),
        "bottom" => (0, picture.height()),
        other => return Err(MemeError::ArgMismatch(format!("unsupported position: {}", other))),
    };

    let mut frame = canvas::filled(WIDTH, height, [255, 255, 255, 255]);
    imageops::overlay(&mut frame, &picture, 0, picture_y as i64);
    let size = canvas::fit_font_size(text, WIDTH, 40);
    let fill = canvas::escape_xml(&args.color);
    let label = canvas::render_svg(
        &canvas::text_element(text, WIDTH / 2, BAND / 2, size, &fill),
        WIDTH,
        BAND,
    )?;
    imageops::overlay(&mut frame, &label, 0, band_y as i64);

    canvas::encode_jpeg(&DynamicImage::ImageRgba8(frame), 90)
}

pub fn meme() -> Meme {
    Meme::builder("caption", caption)
        .images(1, 1)
        .texts(1, 1)
        .default_texts(&["我好了"])
        .args(
            ArgsModel::new(
                "CaptionArgs",
                vec![
                    ArgField::choice("position", "bottom", &["top", "bottom"], "文字位置"),
                    ArgField::text("color", "#000000", "文字颜色"),
                ],
            ),
            vec![
                example(json!({"position": "bottom", "color": "#000000"})),
                example(json!({"position": "top", "color": "#d62828"})),
            ],
            vec![
                ParserOption::value(&["--position", "位置"], "position", "top|bottom", "文字位置"),
                ParserOption::value(&["--color", "颜色"], "color", "color", "文字颜色"),
            ],
        )
        .keywords(&["配文", "caption"])
        .tags(&["text"])
        .dates(datetime!(2022-11-05 10:00 UTC), datetime!(2024-07-30 18:45 UTC))
        .build()
}
