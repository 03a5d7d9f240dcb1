//! Named color palettes for rendering.

use crate::error::{Result, SoundsightError};
use image::Rgba;

#[derive(Debug, Clone, Copy)]
struct Stop {
    pos: f64,
    color: Rgba<u8>,
}

/// A monotonic RGB gradient defined by position/color stops.
///
/// `sample` maps a normalized value to an RGBA color: values at or
/// below 0 take the first stop, at or above 1 the last, and anything
/// between interpolates linearly inside the bracketing pair.
#[derive(Debug, Clone)]
pub struct Palette {
    stops: Vec<Stop>,
}

impl Palette {
    /// Returns the palette registered under `name`.
    pub fn by_name(name: &str) -> Result<Palette> {
        let stops = match name {
            "classic" => vec![
                stop(0.0, 0, 0, 0),
                stop(0.2, 0, 32, 96),
                stop(0.45, 0, 160, 200),
                stop(0.7, 255, 180, 0),
                stop(1.0, 255, 255, 255),
            ],
            "magma" => vec![
                stop(0.0, 0, 0, 4),
                stop(0.25, 59, 12, 87),
                stop(0.5, 180, 54, 122),
                stop(0.75, 251, 140, 60),
                stop(1.0, 252, 253, 191),
            ],
            "inferno" => vec![
                stop(0.0, 0, 0, 4),
                stop(0.25, 61, 9, 101),
                stop(0.5, 187, 55, 84),
                stop(0.75, 249, 142, 8),
                stop(1.0, 252, 255, 164),
            ],
            "viridis" => vec![
                stop(0.0, 68, 1, 84),
                stop(0.25, 58, 82, 139),
                stop(0.5, 32, 144, 140),
                stop(0.75, 94, 201, 98),
                stop(1.0, 253, 231, 37),
            ],
            // Ocean depths up to coral brightness.
            "clawd" => vec![
                stop(0.0, 2, 4, 15),
                stop(0.2, 11, 38, 74),
                stop(0.4, 18, 97, 117),
                stop(0.6, 193, 98, 92),
                stop(0.8, 205, 55, 40),
                stop(1.0, 255, 230, 210),
            ],
            "gray" | "grey" => vec![stop(0.0, 0, 0, 0), stop(1.0, 255, 255, 255)],
            _ => {
                return Err(SoundsightError::InvalidArgument(
                    "unknown palette".to_string(),
                ))
            }
        };
        Ok(Palette { stops })
    }

    /// Maps a normalized value in [0, 1] to an RGBA color.
    pub fn sample(&self, t: f64) -> Rgba<u8> {
        if t <= 0.0 {
            return self.stops[0].color;
        }
        if t >= 1.0 {
            return self.stops[self.stops.len() - 1].color;
        }
        for pair in self.stops.windows(2) {
            if t >= pair[0].pos && t <= pair[1].pos {
                let span = pair[1].pos - pair[0].pos;
                if span <= 0.0 {
                    return pair[1].color;
                }
                let local = (t - pair[0].pos) / span;
                return lerp(pair[0].color, pair[1].color, local);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

fn lerp(a: Rgba<u8>, b: Rgba<u8>, t: f64) -> Rgba<u8> {
    let channel = |ac: u8, bc: u8| (ac as f64 + (bc as f64 - ac as f64) * t) as u8;
    Rgba([
        channel(a.0[0], b.0[0]),
        channel(a.0[1], b.0[1]),
        channel(a.0[2], b.0[2]),
        255,
    ])
}

fn stop(pos: f64, r: u8, g: u8, b: u8) -> Stop {
    Stop {
        pos,
        color: Rgba([r, g, b, 255]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_clamp_to_stops() {
        let p = Palette::by_name("classic").unwrap();
        assert_eq!(p.sample(-0.5), Rgba([0, 0, 0, 255]));
        assert_eq!(p.sample(0.0), Rgba([0, 0, 0, 255]));
        assert_eq!(p.sample(1.0), Rgba([255, 255, 255, 255]));
        assert_eq!(p.sample(1.5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_classic_midpoint_interpolation() {
        // 0.5 sits between the 0.45 and 0.70 stops, local t = 0.2.
        let p = Palette::by_name("classic").unwrap();
        assert_eq!(p.sample(0.5), Rgba([51, 164, 160, 255]));
    }

    #[test]
    fn test_gray_and_alias() {
        let gray = Palette::by_name("gray").unwrap();
        let grey = Palette::by_name("grey").unwrap();
        assert_eq!(gray.sample(0.5), Rgba([127, 127, 127, 255]));
        assert_eq!(gray.sample(0.5), grey.sample(0.5));
    }

    #[test]
    fn test_all_known_names_resolve() {
        for name in ["classic", "magma", "inferno", "viridis", "clawd", "gray", "grey"] {
            assert!(Palette::by_name(name).is_ok(), "palette {} missing", name);
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = Palette::by_name("neon").unwrap_err();
        assert!(err.to_string().contains("unknown palette"));
    }

    #[test]
    fn test_alpha_always_opaque() {
        let p = Palette::by_name("viridis").unwrap();
        for i in 0..=10 {
            assert_eq!(p.sample(i as f64 / 10.0).0[3], 255);
        }
    }
}
