//! Spectrogram renderer.

use super::palette::Palette;
use crate::dsp::Spectrogram;
use crate::error::{Result, SoundsightError};
use image::RgbaImage;

/// Options for spectrogram rendering.
///
/// With `clamp_db` unset the spectrogram's own extremes set the
/// dynamic range; otherwise `(min_db, max_db)` does. `min_freq` /
/// `max_freq` of 0 mean "no bound".
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub width: u32,
    pub height: u32,
    pub min_freq: f64,
    pub max_freq: f64,
    pub palette: Option<Palette>,
    pub min_db: f64,
    pub max_db: f64,
    pub clamp_db: bool,
    pub flip_vert: bool,
}

/// Renders a spectrogram into an RGBA image. Low frequencies map to
/// the bottom of the image unless `flip_vert` is set.
pub fn spectrogram(spec: &Spectrogram, opts: &Options) -> Result<RgbaImage> {
    if opts.width == 0 || opts.height == 0 {
        return Err(SoundsightError::InvalidArgument(
            "invalid output size".to_string(),
        ));
    }
    let palette = opts
        .palette
        .as_ref()
        .ok_or_else(|| SoundsightError::Internal("palette required".to_string()))?;

    let mut min_db = spec.min;
    let mut max_db = spec.max;
    if opts.clamp_db {
        min_db = opts.min_db;
        max_db = opts.max_db;
    }
    if max_db <= min_db {
        max_db = min_db + 1.0;
    }

    let mut min_bin = 0usize;
    let mut max_bin = spec.bins - 1;
    if opts.min_freq > 0.0 {
        min_bin = (opts.min_freq / spec.bin_hz) as usize;
    }
    if opts.max_freq > 0.0 {
        max_bin = (opts.max_freq / spec.bin_hz) as usize;
    }
    if max_bin >= spec.bins {
        max_bin = spec.bins - 1;
    }
    if max_bin <= min_bin {
        // Forgiving fallback: an inverted or out-of-range frequency
        // window resets to the full bin range.
        min_bin = 0;
        max_bin = spec.bins - 1;
    }
    let bin_span = max_bin - min_bin;

    let mut img = RgbaImage::new(opts.width, opts.height);
    let frames = spec.frames;
    let bins = spec.bins;
    for x in 0..opts.width {
        let frame = if frames > 1 && opts.width > 1 {
            (x as f64 * (frames - 1) as f64 / (opts.width - 1) as f64).round() as usize
        } else {
            0
        };
        let frame_offset = frame * bins;
        for y in 0..opts.height {
            let pos = if opts.height > 1 {
                y as f64 / (opts.height - 1) as f64
            } else {
                0.0
            };
            let bin = (min_bin + ((1.0 - pos) * bin_span as f64).round() as usize).clamp(min_bin, max_bin);
            let val = spec.values[frame_offset + bin];
            let norm = ((val - min_db) / (max_db - min_db)).clamp(0.0, 1.0);
            let ypos = if opts.flip_vert { opts.height - 1 - y } else { y };
            img.put_pixel(x, ypos, palette.sample(norm));
        }
    }
    Ok(img)
}
