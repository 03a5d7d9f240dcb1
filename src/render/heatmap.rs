//! Generic feature-map renderer.

use super::palette::Palette;
use crate::dsp::FeatureMap;
use crate::error::{Result, SoundsightError};
use image::RgbaImage;

/// Options for feature-map rendering. With `clamp` unset the map's
/// own extremes set the dynamic range.
#[derive(Debug, Clone, Default)]
pub struct HeatmapOptions {
    pub width: u32,
    pub height: u32,
    pub palette: Option<Palette>,
    pub min: f64,
    pub max: f64,
    pub clamp: bool,
    pub flip_vert: bool,
}

/// Renders a feature map into an RGBA image with nearest-neighbour
/// resampling on both axes.
pub fn heatmap(map: &FeatureMap, opts: &HeatmapOptions) -> Result<RgbaImage> {
    if opts.width == 0 || opts.height == 0 {
        return Err(SoundsightError::InvalidArgument(
            "invalid output size".to_string(),
        ));
    }
    let palette = opts
        .palette
        .as_ref()
        .ok_or_else(|| SoundsightError::Internal("palette required".to_string()))?;
    if map.width == 0 || map.height == 0 {
        return Err(SoundsightError::InvalidArgument(
            "invalid feature map".to_string(),
        ));
    }

    let mut min_val = map.min;
    let mut max_val = map.max;
    if opts.clamp {
        min_val = opts.min;
        max_val = opts.max;
    }
    if max_val <= min_val {
        max_val = min_val + 1.0;
    }

    let mut img = RgbaImage::new(opts.width, opts.height);
    for x in 0..opts.width {
        let src_x = if map.width > 1 && opts.width > 1 {
            (x as f64 * (map.width - 1) as f64 / (opts.width - 1) as f64).round() as usize
        } else {
            0
        };
        for y in 0..opts.height {
            let mut src_y = if map.height > 1 && opts.height > 1 {
                (y as f64 * (map.height - 1) as f64 / (opts.height - 1) as f64).round() as usize
            } else {
                0
            };
            if opts.flip_vert {
                src_y = map.height - 1 - src_y;
            }
            let val = map.values[src_y * map.width + src_x];
            let norm = ((val - min_val) / (max_val - min_val)).clamp(0.0, 1.0);
            img.put_pixel(x, y, palette.sample(norm));
        }
    }
    Ok(img)
}
