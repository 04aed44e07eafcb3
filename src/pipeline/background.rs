use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage, imageops::FilterType};

use crate::types::{ColorImage, Resolution};

const CLOUD_BACKGROUND_PNG: &[u8] = include_bytes!("../../assets/cloud_background.png");

/// Loads the packaged background at the depth resolution.
pub fn load_background(resolution: Resolution) -> Result<ColorImage> {
    decode_background(CLOUD_BACKGROUND_PNG, resolution).context("failed to load background asset")
}

pub fn decode_background(bytes: &[u8], resolution: Resolution) -> Result<ColorImage> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
    let fitted = fit_to(decoded, resolution);
    let (width, height) = fitted.dimensions();

    Ok(ColorImage {
        width,
        height,
        pixels: fitted.pixels().map(|px| px.0).collect(),
    })
}

fn fit_to(img: RgbaImage, resolution: Resolution) -> RgbaImage {
    if img.dimensions() == (resolution.width, resolution.height) {
        return img;
    }
    log::warn!(
        "background is {}x{}, resizing to {}x{}",
        img.width(),
        img.height(),
        resolution.width,
        resolution.height
    );
    image::imageops::resize(&img, resolution.width, resolution.height, FilterType::CatmullRom)
}
