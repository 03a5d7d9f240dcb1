use image::GenericImageView;
use soundsight::render::Palette;
use soundsight::viz::{self, Context, Kind, RenderOptions};
use soundsight::Audio;
use std::f64::consts::PI;
use tempfile::TempDir;

/// One second of a 440 Hz sine at 44100 Hz.
fn sine_440() -> Audio {
    let sample_rate = 44100u32;
    let samples: Vec<f64> = (0..sample_rate)
        .map(|i| (2.0 * PI * 440.0 * i as f64 / sample_rate as f64).sin())
        .collect();
    Audio {
        sample_rate,
        samples,
    }
}

fn options(width: u32, height: u32) -> RenderOptions {
    RenderOptions {
        width,
        height,
        palette: Palette::by_name("classic").unwrap(),
        min_freq: 0.0,
        max_freq: 0.0,
    }
}

#[test]
fn test_spectrogram_end_to_end() {
    let audio = sine_440();
    let ctx = Context::new(audio.samples, audio.sample_rate, 2048, 512);

    assert_eq!(ctx.spec.bins, 1025);
    assert!(ctx.spec.frames >= 1);
    assert_eq!(ctx.spec.values.len(), ctx.spec.frames * ctx.spec.bins);

    let img = viz::render(Kind::Spectrogram, &ctx, &options(320, 180)).unwrap();
    assert_eq!(img.dimensions(), (320, 180));

    // The 440 Hz tone lives near bin round(440 / (44100/2048)) = 20,
    // which maps close to the bottom of the image. Find the brightest
    // row of a middle column and check it sits in the bottom tenth.
    let x = 160;
    let mut best_y = 0;
    let mut best_lum = 0u32;
    for y in 0..180 {
        let p = img.get_pixel(x, y);
        let lum = p.0[0] as u32 + p.0[1] as u32 + p.0[2] as u32;
        if lum > best_lum {
            best_lum = lum;
            best_y = y;
        }
    }
    assert!(best_y > 162, "tone row {} not near bottom", best_y);
}

#[test]
fn test_slice_then_analyze() {
    let audio = sine_440();
    let sliced = audio.slice(0.25, 0.5).unwrap();
    assert_eq!(sliced.samples.len(), 22050);

    let ctx = Context::new(sliced.samples, sliced.sample_rate, 1024, 256);
    let img = viz::render(Kind::Mel, &ctx, &options(64, 48)).unwrap();
    assert_eq!(img.dimensions(), (64, 48));
}

#[test]
fn test_all_kinds_render_and_are_deterministic() {
    let audio = sine_440();
    // A short slice keeps the self-similarity matrix small.
    let sliced = audio.slice(0.0, 0.25).unwrap();
    let ctx = Context::new(sliced.samples, sliced.sample_rate, 1024, 256);
    let opts = options(64, 48);

    for kind in Kind::ALL {
        let a = viz::render(kind, &ctx, &opts).unwrap();
        let b = viz::render(kind, &ctx, &opts).unwrap();
        assert_eq!(a.dimensions(), (64, 48), "kind {}", kind);
        assert_eq!(a.as_raw(), b.as_raw(), "kind {} not deterministic", kind);
    }
}

#[test]
fn test_images_written_to_disk_round_trip() {
    let audio = sine_440();
    let sliced = audio.slice(0.0, 0.2).unwrap();
    let ctx = Context::new(sliced.samples, sliced.sample_rate, 1024, 256);

    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("spectrogram.png");

    let img = viz::render(Kind::Spectrogram, &ctx, &options(80, 60)).unwrap();
    img.save(&path).expect("failed to save image");

    let reloaded = image::open(&path).expect("failed to reload image");
    assert_eq!(reloaded.dimensions(), (80, 60));
}

#[test]
fn test_unknown_names_are_rejected() {
    assert!(Palette::by_name("sunset").is_err());
    let err = viz::parse_list(&["spectrogram,ripple".to_string()]).unwrap_err();
    assert!(err.to_string().contains("unknown viz: ripple"));
}
