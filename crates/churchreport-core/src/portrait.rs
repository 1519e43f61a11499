//! Round profile pictures for printed member lists.
//!
//! Any decodable image is center-cropped to a square and given a circular
//! alpha mask with a slightly blurred edge. The result is always PNG.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::filter::gaussian_blur_f32;

/// Sigma of the Gaussian blur that softens the circle's edge
pub const DEFAULT_BLUR_RADIUS: f32 = 1.0;

/// Extra inset of the circle from the square's border, in pixels
const MASK_OFFSET: u32 = 2;

/// Edge length of the generated placeholder
const PLACEHOLDER_SIZE: u32 = 256;

const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([0xC8, 0xC8, 0xC8, 0xFF]);

/// Decode `bytes`, crop to a square, cut out a circle and encode as PNG.
pub fn make_round(bytes: &[u8], blur_radius: f32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("Failed to decode portrait image")?;
    let mut square = crop_square(&img.to_rgba8());
    let mask = circle_mask(square.width(), blur_radius);

    for (x, y, px) in square.enumerate_pixels_mut() {
        let alpha = mask.get_pixel(x, y)[0];
        px[3] = px[3].min(alpha);
    }

    encode_png(&square)
}

/// Portrait used for persons without a photo: the file at `path` if given,
/// otherwise a plain grey square.
pub fn placeholder(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) => std::fs::read(p)
            .with_context(|| format!("Failed to read placeholder image {}", p.display())),
        None => encode_png(&RgbaImage::from_pixel(
            PLACEHOLDER_SIZE,
            PLACEHOLDER_SIZE,
            PLACEHOLDER_COLOR,
        )),
    }
}

fn crop_square(img: &RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    let side = w.min(h);
    imageops::crop_imm(img, (w - side) / 2, (h - side) / 2, side, side).to_image()
}

fn circle_mask(side: u32, blur_radius: f32) -> GrayImage {
    let mut mask = GrayImage::new(side, side);
    let inset = (blur_radius.max(0.0) * 2.0).round() as u32 + MASK_OFFSET;
    let radius = (side / 2).saturating_sub(inset);
    if radius > 0 {
        let center = ((side / 2) as i32, (side / 2) as i32);
        draw_filled_circle_mut(&mut mask, center, radius as i32, Luma([255u8]));
    }

    // gaussian_blur_f32 panics on a non-positive sigma
    if blur_radius > 0.0 {
        gaussian_blur_f32(&mask, blur_radius)
    } else {
        mask
    }
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(buffer.into_inner())
}
