use image::{imageops, DynamicImage};
use time::macros::datetime;

use super::canvas;
use crate::models::meme::{Meme, MemeInput};
use crate::utils::error::MemeError;

const CELL: u32 = 240;
const GAP: u32 = 10;

fn side_by_side(input: MemeInput<'_>) -> Result<Vec<u8>, MemeError> {
    let mut frame = canvas::filled(CELL * 2 + GAP * 3, CELL + GAP * 2, [255, 255, 255, 255]);
    for (i, img) in input.images.iter().enumerate() {
        let cell = canvas::square(img, CELL);
        let x = GAP + i as u32 * (CELL + GAP);
        imageops::overlay(&mut frame, &cell, x as i64, GAP as i64);
    }
    canvas::encode_png(&DynamicImage::ImageRgba8(frame))
}

pub fn meme() -> Meme {
    Meme::builder("side_by_side", side_by_side)
        .images(2, 2)
        .keywords(&["并排", "side by side"])
        .tags(&["compare"])
        .dates(datetime!(2023-06-21 15:00 UTC), datetime!(2023-06-21 15:00 UTC))
        .build()
}
