//! Loudness curve renderer.

use super::palette::Palette;
use crate::error::{Result, SoundsightError};
use image::RgbaImage;

/// Renders a loudness curve as bottom-up bars. Values are normalized
/// by their own maximum; empty or all-zero input yields a blank
/// transparent canvas.
pub fn loudness(values: &[f64], width: u32, height: u32, palette: &Palette) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(SoundsightError::InvalidArgument(
            "invalid output size".to_string(),
        ));
    }
    if values.is_empty() {
        return Ok(RgbaImage::new(width, height));
    }

    let max_val = values.iter().copied().fold(0.0f64, f64::max);
    if max_val <= 0.0 {
        return Ok(RgbaImage::new(width, height));
    }

    let mut img = RgbaImage::new(width, height);
    for x in 0..width {
        let src_x = if values.len() > 1 && width > 1 {
            (x as f64 * (values.len() - 1) as f64 / (width - 1) as f64).round() as usize
        } else {
            0
        };
        let norm = (values[src_x] / max_val).clamp(0.0, 1.0);
        let level = (norm * (height - 1) as f64).round() as u32;
        let color = palette.sample(norm);
        for y in (height - 1 - level)..height {
            img.put_pixel(x, y, color);
        }
    }
    Ok(img)
}
