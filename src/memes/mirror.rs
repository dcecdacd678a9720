use image::{imageops, DynamicImage};
use serde::Deserialize;
use serde_json::json;
use time::macros::datetime;

use super::{canvas, example, parse_args};
use crate::models::args::{ArgField, ArgsModel};
use crate::models::meme::{CommandShortcut, Meme, MemeInput, ParserOption};
use crate::utils::error::MemeError;

#[derive(Deserialize)]
struct MirrorArgs {
    direction: String,
}

fn mirror(input: MemeInput<'_>) -> Result<Vec<u8>, MemeError> {
    let args: MirrorArgs = parse_args(input.args)?;
    let img = input.images[0].to_rgba8();
    let flipped = match args.direction.as_str() {
        "horizontal" => imageops::flip_horizontal(&img),
        "vertical" => imageops::flip_vertical(&img),
        other => return Err(MemeError::ArgMismatch(format!("unsupported direction: {}", other))),
    };
    canvas::encode_png(&DynamicImage::ImageRgba8(flipped))
}

pub fn meme() -> Meme {
    Meme::builder("mirror", mirror)
        .images(1, 1)
        .args(
            ArgsModel::new(
                "MirrorArgs",
                vec![ArgField::choice(
                    "direction",
                    "horizontal",
                    &["horizontal", "vertical"],
                    "翻转方向",
                )],
            ),
            vec![
                example(json!({"direction": "horizontal"})),
                example(json!({"direction": "vertical"})),
            ],
            vec![
                ParserOption::constant(&["--horizontal", "左右"], "direction", json!("horizontal"), "左右翻转"),
                ParserOption::constant(&["--vertical", "上下"], "direction", json!("vertical"), "上下翻转"),
            ],
        )
        .keywords(&["镜像", "mirror"])
        .shortcut(CommandShortcut::new("上下镜像", &["--vertical"], None))
        .tags(&["transform"])
        .dates(datetime!(2023-03-10 12:00 UTC), datetime!(2024-05-02 09:30 UTC))
        .build()
}
