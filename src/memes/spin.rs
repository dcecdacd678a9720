use image::imageops;
use serde::Deserialize;
use serde_json::json;
use time::macros::datetime;

use super::{canvas, example, parse_args};
use crate::models::args::{ArgField, ArgsModel};
use crate::models::meme::{Meme, MemeInput, ParserOption};
use crate::utils::error::MemeError;

#[derive(Deserialize)]
struct SpinArgs {
    frame_delay: u32,
    reverse: bool,
}

fn spin(input: MemeInput<'_>) -> Result<Vec<u8>, MemeError> {
    let args: SpinArgs = parse_args(input.args)?;
    let base = canvas::square(&input.images[0], 128);
    let mut frames = vec![
        base.clone(),
        imageops::rotate90(&base),
        imageops::rotate180(&base),
        imageops::rotate270(&base),
    ];
    if args.reverse {
        frames[1..].reverse();
    }
    canvas::encode_gif(frames, args.frame_delay)
}

pub fn meme() -> Meme {
    Meme::builder("spin", spin)
        .images(1, 1)
        .args(
            ArgsModel::new(
                "SpinArgs",
                vec![
                    ArgField::integer("frame_delay", 100, Some(20), Some(1000), "帧间隔（毫秒）"),
                    ArgField::boolean("reverse", false, "逆时针旋转"),
                ],
            ),
            vec![example(json!({"frame_delay": 100, "reverse": false}))],
            vec![
                ParserOption::value(&["-d", "--delay"], "frame_delay", "ms", "帧间隔"),
                ParserOption::constant(&["-r", "--reverse", "逆时针"], "reverse", json!(true), "逆时针旋转"),
            ],
        )
        .keywords(&["转圈", "spin"])
        .tags(&["animated"])
        .dates(datetime!(2023-04-01 08:00 UTC), datetime!(2024-01-18 20:15 UTC))
        .build()
}
