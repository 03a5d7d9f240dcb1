//! Windowed STFT producing a log-magnitude frame grid.

use super::fft::fft_in_place;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Log-magnitude FFT frames, row-major: frame `f`, bin `b` lives at
/// `f * bins + b`. Values are decibels `20*log10(|X| + 1e-9)`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: usize,
    pub bins: usize,
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub sample_rate: u32,
    pub window_size: usize,
    pub hop_size: usize,
    pub bin_hz: f64,
}

/// Returns a Hann window of length n.
pub fn hann_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Computes a log-magnitude spectrogram.
///
/// Zero parameters fall back to defaults: 44100 Hz, 2048-sample
/// window, hop of a quarter window. The window size must be a power
/// of two; the CLI enforces this before calling in.
pub fn compute_spectrogram(
    samples: &[f64],
    sample_rate: u32,
    window_size: usize,
    hop_size: usize,
) -> Spectrogram {
    let window_size = if window_size == 0 { 2048 } else { window_size };
    let hop_size = if hop_size == 0 {
        (window_size / 4).max(1)
    } else {
        hop_size
    };
    let sample_rate = if sample_rate == 0 { 44100 } else { sample_rate };

    let frames = if samples.len() > window_size {
        1 + (samples.len() - window_size + hop_size - 1) / hop_size
    } else {
        1
    };
    let bins = window_size / 2 + 1;
    let mut values = vec![0.0; frames * bins];

    let window = hann_window(window_size);
    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;
    let eps = 1e-9;

    let mut frame = vec![Complex64::new(0.0, 0.0); window_size];
    for f in 0..frames {
        let start = f * hop_size;
        for (i, slot) in frame.iter_mut().enumerate() {
            let idx = start + i;
            *slot = if idx < samples.len() {
                Complex64::new(samples[idx] * window[i], 0.0)
            } else {
                Complex64::new(0.0, 0.0)
            };
        }
        fft_in_place(&mut frame);
        for (b, bin) in frame.iter().take(bins).enumerate() {
            let db = 20.0 * (bin.norm() + eps).log10();
            values[f * bins + b] = db;
            if db < min_val {
                min_val = db;
            }
            if db > max_val {
                max_val = db;
            }
        }
    }

    Spectrogram {
        frames,
        bins,
        values,
        min: min_val,
        max: max_val,
        sample_rate,
        window_size,
        hop_size,
        bin_hz: sample_rate as f64 / window_size as f64,
    }
}
