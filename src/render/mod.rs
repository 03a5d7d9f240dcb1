//! Rendering layer: palettes and pixel renderers for the analysis
//! output.

mod compose;
mod heatmap;
mod loudness;
mod palette;
mod spectrogram;

pub use compose::{compose, Panel};
pub use heatmap::{heatmap, HeatmapOptions};
pub use loudness::loudness;
pub use palette::Palette;
pub use spectrogram::{spectrogram, Options};
