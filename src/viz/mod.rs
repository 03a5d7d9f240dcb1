//! Visualization dispatcher
//!
//! Maps named visualization kinds onto the analysis and rendering
//! layers, choosing a percentile-based dynamic range for each kind.

use crate::dsp::{self, features, FeatureMap, Spectrogram};
use crate::error::{Result, SoundsightError};
use crate::render::{self, HeatmapOptions, Palette, Panel};
use image::{Rgba, RgbaImage};
use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;

/// Vertical gap between stacked panels, in pixels.
const PANEL_GAP: u32 = 4;

/// A named visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Spectrogram,
    Mel,
    Chroma,
    Hpss,
    SelfSim,
    Loudness,
    Tempogram,
    Mfcc,
    Flux,
}

impl Kind {
    /// Every kind, in the order used for help text.
    pub const ALL: [Kind; 9] = [
        Kind::Spectrogram,
        Kind::Mel,
        Kind::Chroma,
        Kind::Hpss,
        Kind::SelfSim,
        Kind::Loudness,
        Kind::Tempogram,
        Kind::Mfcc,
        Kind::Flux,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Kind::Spectrogram => "spectrogram",
            Kind::Mel => "mel",
            Kind::Chroma => "chroma",
            Kind::Hpss => "hpss",
            Kind::SelfSim => "selfsim",
            Kind::Loudness => "loudness",
            Kind::Tempogram => "tempogram",
            Kind::Mfcc => "mfcc",
            Kind::Flux => "flux",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = SoundsightError;

    fn from_str(s: &str) -> Result<Kind> {
        Kind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| SoundsightError::InvalidArgument(format!("unknown viz: {}", s)))
    }
}

/// Normalizes a list of viz names, allowing comma-separated values.
///
/// Names are lowercased and trimmed, duplicates keep their first
/// occurrence, and an empty list defaults to the spectrogram.
pub fn parse_list(raw: &[String]) -> Result<Vec<Kind>> {
    let mut out = Vec::new();
    for entry in raw {
        for part in entry.split(',') {
            let name = part.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let kind: Kind = name.parse()?;
            if !out.contains(&kind) {
                out.push(kind);
            }
        }
    }
    if out.is_empty() {
        out.push(Kind::Spectrogram);
    }
    Ok(out)
}

/// Returns the supported viz list for help text.
pub fn kinds_help() -> String {
    let names: Vec<&str> = Kind::ALL.iter().map(|k| k.name()).collect();
    names.join(", ")
}

/// Shared analysis state for rendering several visualizations of the
/// same audio. The linear power array is computed once on first use
/// and lives as long as the context.
pub struct Context {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    pub window_size: usize,
    pub hop_size: usize,
    pub spec: Spectrogram,
    power: OnceCell<Vec<f64>>,
}

impl Context {
    /// Analyzes the samples and prepares the base spectrogram.
    pub fn new(samples: Vec<f64>, sample_rate: u32, window_size: usize, hop_size: usize) -> Self {
        let spec = dsp::compute_spectrogram(&samples, sample_rate, window_size, hop_size);
        Context {
            samples,
            sample_rate,
            window_size,
            hop_size,
            spec,
            power: OnceCell::new(),
        }
    }

    /// Cached linear power for the spectrogram.
    pub fn power(&self) -> &[f64] {
        self.power
            .get_or_init(|| features::spectrogram_power(&self.spec))
    }
}

/// Options for a single visualization render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub palette: Palette,
    pub min_freq: f64,
    pub max_freq: f64,
}

/// Builds the panel image for one visualization kind.
pub fn render(kind: Kind, ctx: &Context, opts: &RenderOptions) -> Result<RgbaImage> {
    match kind {
        Kind::Spectrogram => {
            let (min_db, max_db) = percentile_range(&ctx.spec.values, 0.05, 0.98);
            render::spectrogram(
                &ctx.spec,
                &render::Options {
                    width: opts.width,
                    height: opts.height,
                    min_freq: opts.min_freq,
                    max_freq: opts.max_freq,
                    palette: Some(opts.palette.clone()),
                    min_db,
                    max_db,
                    clamp_db: true,
                    flip_vert: false,
                },
            )
        }
        Kind::Mel => {
            let mel = features::mel_spectrogram_from_power(
                &ctx.spec,
                ctx.power(),
                0,
                opts.min_freq,
                opts.max_freq,
            );
            let (min_val, max_val) = percentile_range(&mel.values, 0.05, 0.98);
            heatmap_clamped(&mel, opts, min_val, max_val, true)
        }
        Kind::Chroma => {
            let chroma = features::chroma_from_power(&ctx.spec, ctx.power());
            let (min_val, max_val) = percentile_range(&chroma.values, 0.1, 0.98);
            heatmap_clamped(&chroma, opts, min_val, max_val, true)
        }
        Kind::Mfcc => {
            let mfcc = features::mfcc_from_power(
                &ctx.spec,
                ctx.power(),
                0,
                0,
                opts.min_freq,
                opts.max_freq,
            );
            let (min_val, max_val) = percentile_range(&mfcc.values, 0.05, 0.98);
            heatmap_clamped(&mfcc, opts, min_val, max_val, true)
        }
        Kind::Hpss => render_hpss(ctx, opts),
        Kind::SelfSim => {
            let chroma = features::chroma_from_power(&ctx.spec, ctx.power());
            let mut selfsim = features::self_similarity(&chroma, 200);
            apply_gamma(&mut selfsim, 1.4);
            let (min_val, max_val) = percentile_range(&selfsim.values, 0.1, 0.98);
            heatmap_clamped(&selfsim, opts, min_val, max_val, false)
        }
        Kind::Loudness => {
            let rms = features::rms_frames(&ctx.samples, ctx.window_size, ctx.hop_size);
            let clamped = clamp_max(&rms, percentile_value(&rms, 0.95));
            render::loudness(&clamped, opts.width, opts.height, &opts.palette)
        }
        Kind::Tempogram => {
            let temp = features::tempogram(&ctx.spec, 30, 240, 256);
            let (min_val, max_val) = percentile_range(&temp.values, 0.05, 0.98);
            heatmap_clamped(&temp, opts, min_val, max_val, true)
        }
        Kind::Flux => {
            let flux = features::spectral_flux(&ctx.spec);
            let clamped = clamp_max(&flux, percentile_value(&flux, 0.95));
            render::loudness(&clamped, opts.width, opts.height, &opts.palette)
        }
    }
}

fn heatmap_clamped(
    map: &FeatureMap,
    opts: &RenderOptions,
    min: f64,
    max: f64,
    flip_vert: bool,
) -> Result<RgbaImage> {
    render::heatmap(
        map,
        &HeatmapOptions {
            width: opts.width,
            height: opts.height,
            palette: Some(opts.palette.clone()),
            min,
            max,
            clamp: true,
            flip_vert,
        },
    )
}

/// Harmonic on top, percussive below, separated by a small gap.
fn render_hpss(ctx: &Context, opts: &RenderOptions) -> Result<RgbaImage> {
    if opts.height < PANEL_GAP + 2 {
        return Err(SoundsightError::InvalidArgument(
            "invalid output size".to_string(),
        ));
    }
    let half = (opts.height - PANEL_GAP) / 2;
    let (harm, perc) = features::hpss(&ctx.spec, 9, 9);

    let (h_min, h_max) = percentile_range(&harm.values, 0.05, 0.98);
    let mut panel_opts = RenderOptions {
        height: half,
        ..opts.clone()
    };
    let top = heatmap_clamped(&harm, &panel_opts, h_min, h_max, true)?;

    let (p_min, p_max) = percentile_range(&perc.values, 0.05, 0.98);
    panel_opts.height = opts.height - PANEL_GAP - half;
    let bottom = heatmap_clamped(&perc, &panel_opts, p_min, p_max, true)?;

    let panels = [
        Panel { image: top, x: 0, y: 0 },
        Panel {
            image: bottom,
            x: 0,
            y: (half + PANEL_GAP) as i64,
        },
    ];
    render::compose(opts.width, opts.height, &panels, Rgba([0, 0, 0, 255]))
}

/// Picks the low/high percentile values from a strided sample of the
/// input, widening a degenerate range by 1e-6.
fn percentile_range(values: &[f64], low: f64, high: f64) -> (f64, f64) {
    let mut sample = sample_values(values, 20000);
    if sample.is_empty() {
        return (0.0, 1.0);
    }
    sample.sort_by(f64::total_cmp);
    let min_val = sample[percentile_index(&sample, low)];
    let mut max_val = sample[percentile_index(&sample, high)];
    if max_val <= min_val {
        max_val = min_val + 1e-6;
    }
    (min_val, max_val)
}

fn percentile_value(values: &[f64], pct: f64) -> f64 {
    let mut sample = sample_values(values, 20000);
    if sample.is_empty() {
        return 1.0;
    }
    sample.sort_by(f64::total_cmp);
    sample[percentile_index(&sample, pct)]
}

fn percentile_index(values: &[f64], pct: f64) -> usize {
    (pct.clamp(0.0, 1.0) * (values.len() - 1) as f64).round() as usize
}

fn sample_values(values: &[f64], max_samples: usize) -> Vec<f64> {
    if values.len() <= max_samples {
        return values.to_vec();
    }
    let stride = (values.len() / max_samples).max(1);
    values.iter().step_by(stride).copied().collect()
}

fn clamp_max(values: &[f64], max_val: f64) -> Vec<f64> {
    let max_val = if max_val <= 0.0 { 1.0 } else { max_val };
    values.iter().map(|&v| v.min(max_val)).collect()
}

/// Applies a power-law curve to the non-negative cells and re-derives
/// the min/max bounds from the result.
fn apply_gamma(map: &mut FeatureMap, gamma: f64) {
    if map.values.is_empty() {
        return;
    }
    let gamma = if gamma <= 0.0 { 1.0 } else { gamma };
    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;
    for v in map.values.iter_mut() {
        if *v < 0.0 {
            continue;
        }
        *v = v.powf(gamma);
        if *v < min_val {
            min_val = *v;
        }
        if *v > max_val {
            max_val = *v;
        }
    }
    map.min = min_val;
    map.max = max_val;
}
