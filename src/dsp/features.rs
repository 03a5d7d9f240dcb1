//! Feature maps derived from the log-magnitude spectrogram.
//!
//! Everything in here reads spectrogram rows directly (the row-major
//! layout is part of the `Spectrogram` contract) and most functions
//! come in a `_from_power` variant so callers can share one linear
//! power array across several features.

use super::feature_map::{db_to_power, power_to_db, FeatureMap};
use super::spectrogram::Spectrogram;
use std::f64::consts::{LN_10, PI};

const DEFAULT_MEL_BANDS: usize = 40;
const DEFAULT_MFCC_COEFFS: usize = 13;

/// Converts log-magnitude spectrogram values to linear power.
pub fn spectrogram_power(spec: &Spectrogram) -> Vec<f64> {
    spec.values.iter().map(|&v| db_to_power(v)).collect()
}

/// Computes a mel-scaled spectrogram from log-magnitude FFT data.
pub fn mel_spectrogram(spec: &Spectrogram, bands: usize, min_freq: f64, max_freq: f64) -> FeatureMap {
    mel_spectrogram_from_power(spec, &spectrogram_power(spec), bands, min_freq, max_freq)
}

/// Computes a mel spectrogram from linear power.
pub fn mel_spectrogram_from_power(
    spec: &Spectrogram,
    power: &[f64],
    bands: usize,
    min_freq: f64,
    max_freq: f64,
) -> FeatureMap {
    let bands = if bands == 0 { DEFAULT_MEL_BANDS } else { bands };
    let mut max_freq = if max_freq <= 0.0 {
        spec.sample_rate as f64 / 2.0
    } else {
        max_freq
    };
    let min_freq = min_freq.max(0.0);
    if max_freq <= min_freq {
        max_freq = min_freq + 1.0;
    }

    let bins = spec.bins;
    let frames = spec.frames;
    let points = mel_filter_bins(spec.bin_hz, bins, bands, min_freq, max_freq);
    let mut out = FeatureMap::new(frames, bands);

    for f in 0..frames {
        let base = f * bins;
        for m in 0..bands {
            let start = points[m];
            let mut center = points[m + 1];
            let end = points[m + 2];
            if end <= start {
                continue;
            }
            if center <= start || center >= end {
                center = (start + end) / 2;
            }
            let mut energy = 0.0;
            for b in start..=end {
                let weight = if b < center {
                    (b - start) as f64 / (center - start) as f64
                } else if end > center {
                    (end - b) as f64 / (end - center) as f64
                } else {
                    0.0
                };
                energy += power[base + b] * weight.clamp(0.0, 1.0);
            }
            out.set(f, m, power_to_db(energy));
        }
    }
    out
}

/// Computes a 12-bin chromagram from log-magnitude FFT data.
pub fn chroma(spec: &Spectrogram) -> FeatureMap {
    chroma_from_power(spec, &spectrogram_power(spec))
}

/// Computes a 12-bin chromagram from linear power.
///
/// Bins below 30 Hz are skipped; everything else accumulates into
/// the pitch class of its rounded MIDI note.
pub fn chroma_from_power(spec: &Spectrogram, power: &[f64]) -> FeatureMap {
    let frames = spec.frames;
    let bins = spec.bins;
    let mut out = FeatureMap::new(frames, 12);

    for f in 0..frames {
        let base = f * bins;
        for b in 1..bins {
            let freq = b as f64 * spec.bin_hz;
            if freq < 30.0 {
                continue;
            }
            let midi = 69.0 + 12.0 * (freq / 440.0).log2();
            let class = (midi.round() as i64).rem_euclid(12) as usize;
            out.set(f, class, out.at(f, class) + power[base + b]);
        }
    }

    out.min = f64::INFINITY;
    out.max = f64::NEG_INFINITY;
    for f in 0..frames {
        for c in 0..12 {
            out.set(f, c, power_to_db(out.at(f, c)));
        }
    }
    out
}

/// Computes MFCC coefficients from log-magnitude FFT data.
pub fn mfcc(
    spec: &Spectrogram,
    bands: usize,
    coeffs: usize,
    min_freq: f64,
    max_freq: f64,
) -> FeatureMap {
    mfcc_from_power(spec, &spectrogram_power(spec), bands, coeffs, min_freq, max_freq)
}

/// Computes MFCC coefficients (unnormalized DCT-II of the natural-log
/// mel spectrum) from linear power.
pub fn mfcc_from_power(
    spec: &Spectrogram,
    power: &[f64],
    bands: usize,
    coeffs: usize,
    min_freq: f64,
    max_freq: f64,
) -> FeatureMap {
    let bands = if bands == 0 { DEFAULT_MEL_BANDS } else { bands };
    let coeffs = if coeffs == 0 { DEFAULT_MFCC_COEFFS } else { coeffs };
    let coeffs = coeffs.min(bands);
    let mel = mel_spectrogram_from_power(spec, power, bands, min_freq, max_freq);

    let mut out = FeatureMap::new(mel.width, coeffs);
    let mut log_energy = vec![0.0; bands];
    for f in 0..mel.width {
        for (m, slot) in log_energy.iter_mut().enumerate() {
            *slot = mel.at(f, m) / 10.0 * LN_10;
        }
        for k in 0..coeffs {
            let mut sum = 0.0;
            for (n, &e) in log_energy.iter().enumerate() {
                sum += e * (PI / bands as f64 * (n as f64 + 0.5) * k as f64).cos();
            }
            out.set(f, k, sum);
        }
    }
    out
}

/// Separates harmonic and percussive content with median filters
/// along the time and frequency axes.
///
/// Medians use only in-range neighbours; the window shrinks at the
/// edges instead of zero-padding.
pub fn hpss(spec: &Spectrogram, time_width: usize, freq_width: usize) -> (FeatureMap, FeatureMap) {
    let time_width = if time_width == 0 { 9 } else { time_width };
    let freq_width = if freq_width == 0 { 9 } else { freq_width };
    let frames = spec.frames;
    let bins = spec.bins;
    let mut harm = FeatureMap::new(frames, bins);
    let mut perc = FeatureMap::new(frames, bins);

    let time_radius = time_width / 2;
    let freq_radius = freq_width / 2;

    let mut time_buf = Vec::with_capacity(time_width);
    let mut freq_buf = Vec::with_capacity(freq_width);
    for f in 0..frames {
        for b in 0..bins {
            time_buf.clear();
            let lo = f.saturating_sub(time_radius);
            let hi = (f + time_radius).min(frames - 1);
            for tf in lo..=hi {
                time_buf.push(spec.values[tf * bins + b]);
            }
            freq_buf.clear();
            let lo = b.saturating_sub(freq_radius);
            let hi = (b + freq_radius).min(bins - 1);
            for tb in lo..=hi {
                freq_buf.push(spec.values[f * bins + tb]);
            }
            let h_pow = db_to_power(median(&time_buf));
            let p_pow = db_to_power(median(&freq_buf));
            let src = db_to_power(spec.values[f * bins + b]);
            let den = h_pow + p_pow + 1e-12;
            harm.set(f, b, power_to_db(src * h_pow / den));
            perc.set(f, b, power_to_db(src * p_pow / den));
        }
    }
    (harm, perc)
}

/// Computes the positive spectral change between consecutive frames.
pub fn spectral_flux(spec: &Spectrogram) -> Vec<f64> {
    let frames = spec.frames;
    let bins = spec.bins;
    let mut flux = vec![0.0; frames];
    for f in 1..frames {
        let base = f * bins;
        let prev = (f - 1) * bins;
        let mut sum = 0.0;
        for b in 0..bins {
            let diff = spec.values[base + b] - spec.values[prev + b];
            if diff > 0.0 {
                sum += diff;
            }
        }
        flux[f] = sum;
    }
    flux
}

/// Computes a tempo map by autocorrelating spectral flux over
/// candidate beat lags.
pub fn tempogram(spec: &Spectrogram, min_bpm: usize, max_bpm: usize, max_frames: usize) -> FeatureMap {
    let min_bpm = if min_bpm == 0 { 30 } else { min_bpm };
    let max_bpm = if max_bpm <= min_bpm { min_bpm + 60 } else { max_bpm };
    let mut flux = spectral_flux(spec);
    if max_frames > 0 && flux.len() > max_frames {
        flux = downsample_signal(&flux, max_frames);
    }
    let frames = flux.len();
    let bpm_bins = max_bpm - min_bpm + 1;
    let mut out = FeatureMap::new(frames, bpm_bins);

    let mut fps = if spec.hop_size > 0 {
        spec.sample_rate as f64 / spec.hop_size as f64
    } else {
        0.0
    };
    if fps <= 0.0 {
        fps = 1.0;
    }
    let mut window = (fps * 8.0).round() as usize;
    window = window.max(8).min(frames);

    for t in 0..frames {
        let start = t.saturating_sub(window / 2);
        let end = (t + window / 2).min(frames.saturating_sub(1));
        for bpm in min_bpm..=max_bpm {
            let lag = (fps * 60.0 / bpm as f64).round() as usize;
            if lag == 0 {
                continue;
            }
            let mut sum = 0.0;
            let mut i = start + lag;
            while i <= end {
                sum += flux[i] * flux[i - lag];
                i += 1;
            }
            out.set(t, bpm - min_bpm, sum);
        }
    }
    out
}

/// Computes pairwise cosine similarity between the time columns of a
/// feature map, optionally downsampling to `max_frames` columns first.
pub fn self_similarity(map: &FeatureMap, max_frames: usize) -> FeatureMap {
    let downsampled;
    let features = if max_frames > 0 && map.width > max_frames {
        downsampled = downsample_feature_map(map, max_frames);
        &downsampled
    } else {
        map
    };
    let frames = features.width;
    let mut out = FeatureMap::new(frames, frames);
    if frames == 0 {
        return out;
    }

    let norms: Vec<f64> = (0..frames)
        .map(|f| {
            (0..features.height)
                .map(|k| {
                    let v = features.at(f, k);
                    v * v
                })
                .sum::<f64>()
                .sqrt()
        })
        .collect();

    for i in 0..frames {
        for j in 0..frames {
            let dot: f64 = (0..features.height)
                .map(|k| features.at(i, k) * features.at(j, k))
                .sum();
            let den = norms[i] * norms[j];
            let sim = if den > 0.0 { dot / den } else { 0.0 };
            out.set(i, j, sim);
        }
    }
    out
}

/// Reduces the time axis by averaging contiguous frame windows.
pub fn downsample_feature_map(map: &FeatureMap, max_frames: usize) -> FeatureMap {
    if max_frames == 0 || map.width <= max_frames {
        return map.clone();
    }
    let mut out = FeatureMap::new(max_frames, map.height);
    let ratio = map.width as f64 / max_frames as f64;
    for x in 0..max_frames {
        let start = (x as f64 * ratio).floor() as usize;
        let mut end = ((x + 1) as f64 * ratio).floor() as usize;
        if end <= start {
            end = start + 1;
        }
        end = end.min(map.width);
        let count = (end - start) as f64;
        for y in 0..map.height {
            let sum: f64 = (start..end).map(|i| map.at(i, y)).sum();
            out.set(x, y, sum / count);
        }
    }
    out
}

/// Computes RMS per frame over the raw samples. Frames past the end
/// of the input are truncated; a frame with no samples reports 0.
pub fn rms_frames(samples: &[f64], window_size: usize, hop_size: usize) -> Vec<f64> {
    let window_size = if window_size == 0 { 2048 } else { window_size };
    let hop_size = if hop_size == 0 {
        (window_size / 4).max(1)
    } else {
        hop_size
    };
    let frames = if samples.len() > window_size {
        1 + (samples.len() - window_size + hop_size - 1) / hop_size
    } else {
        1
    };
    let mut out = vec![0.0; frames];
    for (f, slot) in out.iter_mut().enumerate() {
        let start = f * hop_size;
        let end = (start + window_size).min(samples.len());
        if start >= end {
            continue;
        }
        let sum: f64 = samples[start..end].iter().map(|&v| v * v).sum();
        *slot = (sum / (end - start) as f64).sqrt();
    }
    out
}

fn mel_filter_bins(bin_hz: f64, bins: usize, bands: usize, min_freq: f64, max_freq: f64) -> Vec<usize> {
    let min_mel = hz_to_mel(min_freq);
    let max_mel = hz_to_mel(max_freq);
    let mut points: Vec<usize> = (0..bands + 2)
        .map(|i| {
            let mel = min_mel + (max_mel - min_mel) * i as f64 / (bands + 1) as f64;
            let bin = (mel_to_hz(mel) / bin_hz).round();
            (bin.max(0.0) as usize).min(bins - 1)
        })
        .collect();
    // Quantization can locally invert the breakpoints; force them
    // monotonic non-decreasing.
    for i in 1..points.len() {
        if points[i] < points[i - 1] {
            points[i] = points[i - 1];
        }
    }
    points
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

fn downsample_signal(input: &[f64], max_frames: usize) -> Vec<f64> {
    if max_frames == 0 || input.len() <= max_frames {
        return input.to_vec();
    }
    let ratio = input.len() as f64 / max_frames as f64;
    (0..max_frames)
        .map(|x| {
            let start = (x as f64 * ratio).floor() as usize;
            let mut end = ((x + 1) as f64 * ratio).floor() as usize;
            if end <= start {
                end = start + 1;
            }
            end = end.min(input.len());
            input[start..end].iter().sum::<f64>() / (end - start) as f64
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut tmp = values.to_vec();
    tmp.sort_by(f64::total_cmp);
    let mid = tmp.len() / 2;
    if tmp.len() % 2 == 0 {
        0.5 * (tmp[mid - 1] + tmp[mid])
    } else {
        tmp[mid]
    }
}
