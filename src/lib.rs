//! Soundsight - audio visualization renderer
//!
//! This library turns decoded mono audio into spectral, tonal, and
//! rhythmic feature maps and renders them as RGBA images through
//! named color palettes.

pub mod audio;
pub mod dsp;
pub mod error;
pub mod render;
pub mod viz;

pub use audio::Audio;
pub use error::{Result, SoundsightError};
