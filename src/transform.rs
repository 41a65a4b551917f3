//! Avatar decoding, fit-mode resizing and circular masking

use crate::error::{PetpetError, Result};
use crate::models::FitMode;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Resampling filter for every avatar resize
const RESAMPLE: FilterType = FilterType::Lanczos3;

/// Sub-samples per axis when computing circular mask coverage
const MASK_SUPERSAMPLE: u32 = 4;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Decode caller-supplied bytes into RGBA, sniffing the container format.
///
/// RGB, grayscale and indexed inputs are expanded to RGBA; existing alpha is
/// kept as-is.
pub fn decode_source(bytes: &[u8]) -> Result<RgbaImage> {
    if bytes.is_empty() {
        return Err(PetpetError::SourceImageInvalid("input is empty".to_string()));
    }
    let image =
        image::load_from_memory(bytes).map_err(|e| PetpetError::SourceImageInvalid(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Scale `avatar` into exactly `size` according to `fit`.
///
/// # Examples
///
/// ```
/// use image::RgbaImage;
/// use petpet::models::FitMode;
/// use petpet::transform::resize;
///
/// let avatar = RgbaImage::from_pixel(40, 20, image::Rgba([9, 9, 9, 255]));
/// for fit in [FitMode::Fill, FitMode::Cover, FitMode::Fit] {
///     assert_eq!(resize(&avatar, (16, 16), fit).dimensions(), (16, 16));
/// }
/// ```
pub fn resize(avatar: &RgbaImage, size: (u32, u32), fit: FitMode) -> RgbaImage {
    let (target_w, target_h) = size;
    let (src_w, src_h) = avatar.dimensions();
    if target_w == 0 || target_h == 0 || src_w == 0 || src_h == 0 {
        return RgbaImage::from_pixel(target_w, target_h, TRANSPARENT);
    }

    match fit {
        FitMode::Fill => imageops::resize(avatar, target_w, target_h, RESAMPLE),
        FitMode::Cover => cover(avatar, target_w, target_h),
        FitMode::Fit => contain(avatar, target_w, target_h),
    }
}

fn cover(avatar: &RgbaImage, target_w: u32, target_h: u32) -> RgbaImage {
    let (src_w, src_h) = avatar.dimensions();
    let scale = f64::max(target_w as f64 / src_w as f64, target_h as f64 / src_h as f64);

    // Rounding may undershoot by a pixel; the crop needs at least the target.
    let scaled_w = ((src_w as f64 * scale).round() as u32).max(target_w);
    let scaled_h = ((src_h as f64 * scale).round() as u32).max(target_h);
    let scaled = imageops::resize(avatar, scaled_w, scaled_h, RESAMPLE);

    let left = (scaled_w - target_w) / 2;
    let top = (scaled_h - target_h) / 2;
    imageops::crop_imm(&scaled, left, top, target_w, target_h).to_image()
}

fn contain(avatar: &RgbaImage, target_w: u32, target_h: u32) -> RgbaImage {
    let (src_w, src_h) = avatar.dimensions();
    let scale = f64::min(target_w as f64 / src_w as f64, target_h as f64 / src_h as f64);

    let scaled_w = ((src_w as f64 * scale).round() as u32).clamp(1, target_w);
    let scaled_h = ((src_h as f64 * scale).round() as u32).clamp(1, target_h);
    let scaled = imageops::resize(avatar, scaled_w, scaled_h, RESAMPLE);

    let mut canvas = RgbaImage::from_pixel(target_w, target_h, TRANSPARENT);
    let x = (target_w - scaled_w) / 2;
    let y = (target_h - scaled_h) / 2;
    imageops::replace(&mut canvas, &scaled, x as i64, y as i64);
    canvas
}

/// Multiply alpha by an anti-aliased ellipse inscribed in the image bounds.
///
/// Pixels fully outside the ellipse end up with alpha 0; edge pixels get
/// partial coverage from supersampling.
pub fn circular_mask(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width == 0 || height == 0 {
        return out;
    }

    let rx = width as f64 / 2.0;
    let ry = height as f64 / 2.0;
    let step = 1.0 / MASK_SUPERSAMPLE as f64;
    let total = (MASK_SUPERSAMPLE * MASK_SUPERSAMPLE) as f64;

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let mut inside = 0u32;
        for sy in 0..MASK_SUPERSAMPLE {
            let dy = (y as f64 + (sy as f64 + 0.5) * step - ry) / ry;
            for sx in 0..MASK_SUPERSAMPLE {
                let dx = (x as f64 + (sx as f64 + 0.5) * step - rx) / rx;
                if dx * dx + dy * dy <= 1.0 {
                    inside += 1;
                }
            }
        }

        let coverage = inside as f64 / total;
        pixel[3] = (pixel[3] as f64 * coverage).round() as u8;
    }

    out
}
