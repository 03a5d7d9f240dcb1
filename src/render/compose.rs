//! Panel composition onto a shared canvas.

use crate::error::{Result, SoundsightError};
use image::{imageops, Rgba, RgbaImage};

/// An image placed at a coordinate in the final canvas.
#[derive(Debug, Clone)]
pub struct Panel {
    pub image: RgbaImage,
    pub x: i64,
    pub y: i64,
}

/// Paints `background` over the whole canvas, then overlays each
/// panel in order with source-over compositing.
pub fn compose(width: u32, height: u32, panels: &[Panel], background: Rgba<u8>) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(SoundsightError::InvalidArgument(
            "invalid output size".to_string(),
        ));
    }
    let mut canvas = RgbaImage::from_pixel(width, height, background);
    for panel in panels {
        imageops::overlay(&mut canvas, &panel.image, panel.x, panel.y);
    }
    Ok(canvas)
}
