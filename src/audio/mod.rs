//! Audio input layer
//!
//! Decoding is handled by symphonia; everything downstream of this
//! module consumes a finished mono sample buffer.

mod decode;

pub use decode::{decode_bytes, decode_file};

use crate::error::{Result, SoundsightError};

/// Mono audio samples, nominally in [-1, 1].
#[derive(Debug, Clone)]
pub struct Audio {
    pub sample_rate: u32,
    pub samples: Vec<f64>,
}

impl Audio {
    /// Returns a time-based sub-range of the samples, in seconds.
    ///
    /// A zero duration selects everything from `start_sec` to the end
    /// of the input; the range must not be empty.
    pub fn slice(&self, start_sec: f64, duration_sec: f64) -> Result<Audio> {
        if start_sec < 0.0 || duration_sec < 0.0 {
            return Err(SoundsightError::InvalidArgument(
                "slice: start and duration must be >= 0".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(SoundsightError::InvalidArgument(
                "slice: invalid sample rate".to_string(),
            ));
        }
        if self.samples.is_empty() {
            return Err(SoundsightError::InvalidArgument(
                "slice: empty samples".to_string(),
            ));
        }

        let start = (start_sec * self.sample_rate as f64) as usize;
        if start >= self.samples.len() {
            return Err(SoundsightError::InvalidArgument(
                "slice: start beyond end".to_string(),
            ));
        }
        let mut end = self.samples.len();
        if duration_sec > 0.0 {
            end = (start + (duration_sec * self.sample_rate as f64) as usize).min(self.samples.len());
            if end <= start {
                return Err(SoundsightError::InvalidArgument(
                    "slice: duration too short".to_string(),
                ));
            }
        }

        Ok(Audio {
            sample_rate: self.sample_rate,
            samples: self.samples[start..end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, sample_rate: u32) -> Audio {
        Audio {
            sample_rate,
            samples: (0..len).map(|i| i as f64).collect(),
        }
    }

    #[test]
    fn test_slice_selects_time_range() {
        // Samples 0..9 at 10 Hz, start 0.2s, duration 0.5s => [2, 7).
        let audio = ramp(10, 10);
        let sliced = audio.slice(0.2, 0.5).unwrap();
        assert_eq!(sliced.samples.len(), 5);
        assert_eq!(sliced.samples[0], 2.0);
        assert_eq!(sliced.samples[4], 6.0);
    }

    #[test]
    fn test_slice_zero_args_returns_everything() {
        let audio = ramp(10, 10);
        let sliced = audio.slice(0.0, 0.0).unwrap();
        assert_eq!(sliced.samples.len(), 10);
    }

    #[test]
    fn test_slice_truncates_at_end() {
        let audio = ramp(10, 10);
        let sliced = audio.slice(0.5, 10.0).unwrap();
        assert_eq!(sliced.samples.len(), 5);
    }

    #[test]
    fn test_slice_rejects_bad_input() {
        let audio = ramp(10, 10);
        assert!(audio.slice(-0.1, 0.0).is_err());
        assert!(audio.slice(0.0, -0.1).is_err());
        assert!(audio.slice(2.0, 0.0).is_err(), "start beyond end");

        let no_rate = Audio { sample_rate: 0, samples: vec![0.0] };
        assert!(no_rate.slice(0.0, 0.0).is_err());

        let empty = Audio { sample_rate: 10, samples: Vec::new() };
        assert!(empty.slice(0.0, 0.0).is_err());
    }
}
