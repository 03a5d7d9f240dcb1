//! Spectral analysis: FFT, spectrogram, and derived feature maps.

mod feature_map;
mod fft;
mod spectrogram;

pub mod features;

pub use feature_map::{db_to_power, power_to_db, FeatureMap};
pub use fft::fft_in_place;
pub use spectrogram::{compute_spectrogram, hann_window, Spectrogram};
