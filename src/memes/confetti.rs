use serde::Deserialize;
use serde_json::json;
use time::macros::datetime;

use super::{canvas, example, parse_args};
use crate::models::args::{ArgField, ArgsModel};
use crate::models::meme::{Meme, MemeInput, ParserOption};
use crate::utils::error::MemeError;

const SIZE: u32 = 160;
const COLORS: [[u8; 4]; 5] = [
    [231, 76, 60, 255],
    [241, 196, 15, 255],
    [46, 204, 113, 255],
    [52, 152, 219, 255],
    [155, 89, 182, 255],
];

#[derive(Deserialize)]
struct ConfettiArgs {
    speed: f64,
}

fn confetti(input: MemeInput<'_>) -> Result<Vec<u8>, MemeError> {
    let args: ConfettiArgs = parse_args(input.args)?;
    let fall = (12.0 * args.speed).round().max(1.0) as u32;
    // 固定的伪随机序列，保证每次输出一致
    let mut seed: u32 = 0x2545_f491;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        seed
    };
    let pieces: Vec<(u32, u32, usize)> = (0..40)
        .map(|_| (next() % SIZE, next() % SIZE, (next() % COLORS.len() as u32) as usize))
        .collect();

    let frames = (0..6u32)
        .map(|step| {
            let mut frame = canvas::filled(SIZE, SIZE, [255, 255, 255, 255]);
            for &(x, y, color) in &pieces {
                let y = (y + step * fall) % SIZE;
                for dx in 0..4 {
                    for dy in 0..4 {
                        if x + dx < SIZE && y + dy < SIZE {
                            frame.put_pixel(x + dx, y + dy, image::Rgba(COLORS[color]));
                        }
                    }
                }
            }
            frame
        })
        .collect();
    canvas::encode_gif(frames, 80)
}

pub fn meme() -> Meme {
    Meme::builder("confetti", confetti)
        .args(
            ArgsModel::new(
                "ConfettiArgs",
                vec![ArgField::number("speed", 1.0, Some(0.5), Some(3.0), "下落速度倍率")],
            ),
            vec![example(json!({"speed": 1.0})), example(json!({"speed": 2.5}))],
            vec![ParserOption::value(&["-s", "--speed", "速度"], "speed", "倍率", "下落速度")],
        )
        .keywords(&["撒花", "confetti"])
        .tags(&["animated"])
        .dates(datetime!(2024-01-01 00:00 UTC), datetime!(2024-01-01 00:00 UTC))
        .build()
}
