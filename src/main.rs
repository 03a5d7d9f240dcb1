use anyhow::{bail, Context, Result};
use clap::Parser;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use soundsight::render::{self, Palette, Panel};
use soundsight::{audio, viz};
use std::io::{Cursor, Read, Write};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "soundsight")]
#[command(about = "Render audio as spectrogram and feature visualizations", long_about = None)]
struct Args {
    /// Audio file path, or '-' to read from stdin
    input: String,

    /// Output image path (defaults next to the input)
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Output format: jpg or png (an explicit output extension wins)
    #[arg(long)]
    format: Option<String>,

    /// Output width in pixels
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// FFT window size in samples (power of two)
    #[arg(long = "window", default_value_t = 2048)]
    window_size: usize,

    /// Hop size in samples
    #[arg(long = "hop", default_value_t = 512)]
    hop_size: usize,

    /// Minimum frequency in Hz
    #[arg(long = "min-freq", default_value_t = 0.0)]
    min_freq: f64,

    /// Maximum frequency in Hz (0 = Nyquist)
    #[arg(long = "max-freq", default_value_t = 0.0)]
    max_freq: f64,

    /// Start time in seconds
    #[arg(long = "start", default_value_t = 0.0)]
    start_sec: f64,

    /// Duration in seconds (0 = full)
    #[arg(long = "duration", default_value_t = 0.0)]
    duration_sec: f64,

    /// Visualizations to render, comma separated
    #[arg(long = "viz")]
    viz: Vec<String>,

    /// Palette style: classic, magma, inferno, viridis, clawd, gray
    #[arg(long, default_value = "classic")]
    style: String,

    /// Suppress stdout output
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if args.width == 0 || args.height == 0 {
        bail!("--width and --height must be > 0");
    }
    if args.window_size == 0 || args.hop_size == 0 {
        bail!("--window and --hop must be > 0");
    }
    if !args.window_size.is_power_of_two() {
        bail!("--window must be a power of two");
    }
    if args.max_freq > 0.0 && args.max_freq <= args.min_freq {
        bail!("--max-freq must be > --min-freq");
    }
    if args.start_sec < 0.0 || args.duration_sec < 0.0 {
        bail!("--start and --duration must be >= 0");
    }

    let format_set = args.format.is_some();
    let mut format = args
        .format
        .clone()
        .unwrap_or_else(|| "jpg".to_string())
        .to_lowercase();
    if format == "jpeg" {
        format = "jpg".to_string();
    }
    if format != "jpg" && format != "png" {
        bail!("--format must be jpg or png");
    }

    let kinds = viz::parse_list(&args.viz)
        .with_context(|| format!("valid visualizations: {}", viz::kinds_help()))?;

    let style = args.style.trim().to_lowercase();
    let palette = Palette::by_name(&style)?;

    let output = resolve_output(&args.input, args.output.as_deref(), &mut format, format_set);

    log::info!("input: {}", args.input);
    log::info!("output: {} ({})", output, format);

    let mut pcm = if args.input == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("failed to read stdin")?;
        audio::decode_bytes(&data)?
    } else {
        audio::decode_file(Path::new(&args.input))?
    };
    if pcm.samples.is_empty() {
        bail!("no samples decoded");
    }
    log::info!(
        "decoded {} samples @ {} Hz",
        pcm.samples.len(),
        pcm.sample_rate
    );

    if args.start_sec > 0.0 || args.duration_sec > 0.0 {
        pcm = pcm.slice(args.start_sec, args.duration_sec)?;
        log::info!(
            "slice: {:.2}s + {:.2}s => {} samples",
            args.start_sec,
            args.duration_sec,
            pcm.samples.len()
        );
    }

    let ctx = viz::Context::new(pcm.samples, pcm.sample_rate, args.window_size, args.hop_size);
    let render_opts = viz::RenderOptions {
        width: args.width,
        height: args.height,
        palette,
        min_freq: args.min_freq,
        max_freq: args.max_freq,
    };

    let mut images = Vec::with_capacity(kinds.len());
    for kind in &kinds {
        log::debug!("rendering {}", kind);
        images.push(viz::render(*kind, &ctx, &render_opts)?);
    }
    let img = stack_panels(images, args.width, args.height)?;

    let encoded = encode_image(&img, &format)?;
    if output == "-" {
        std::io::stdout()
            .write_all(&encoded)
            .context("failed to write image to stdout")?;
    } else {
        std::fs::write(&output, &encoded)
            .with_context(|| format!("failed to write {}", output))?;
        if !args.quiet {
            println!("{}", output);
        }
    }

    Ok(())
}

/// Derives the output path and final format: an explicit output
/// extension overrides --format, an extension-less output keeps its
/// name only when --format was given explicitly.
fn resolve_output(input: &str, output: Option<&str>, format: &mut String, format_set: bool) -> String {
    match output {
        None => {
            if input == "-" {
                format!("soundsight.{}", format)
            } else {
                Path::new(input)
                    .with_extension(format.as_str())
                    .to_string_lossy()
                    .into_owned()
            }
        }
        Some("-") => "-".to_string(),
        Some(path) => {
            let ext = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase());
            match ext.as_deref() {
                Some("png") => {
                    *format = "png".to_string();
                    path.to_string()
                }
                Some("jpg") | Some("jpeg") => {
                    *format = "jpg".to_string();
                    path.to_string()
                }
                _ if !format_set => format!("{}.{}", path, format),
                _ => path.to_string(),
            }
        }
    }
}

/// Stacks multiple viz panels vertically with a small gap; a single
/// panel passes through untouched.
fn stack_panels(mut images: Vec<RgbaImage>, width: u32, height: u32) -> Result<RgbaImage> {
    const GAP: u32 = 4;
    if images.len() == 1 {
        return Ok(images.remove(0));
    }
    let count = images.len() as u32;
    let total_height = count * height + (count - 1) * GAP;
    let panels: Vec<Panel> = images
        .into_iter()
        .enumerate()
        .map(|(i, image)| Panel {
            image,
            x: 0,
            y: (i as u32 * (height + GAP)) as i64,
        })
        .collect();
    Ok(render::compose(
        width,
        total_height,
        &panels,
        Rgba([0, 0, 0, 255]),
    )?)
}

/// Encodes an RGBA image as PNG or quality-95 JPEG.
fn encode_image(img: &RgbaImage, format: &str) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        "png" => img
            .write_to(&mut buffer, ImageFormat::Png)
            .context("failed to encode PNG")?,
        "jpg" => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, 95);
            encoder
                .encode_image(&rgb)
                .context("failed to encode JPEG")?;
        }
        other => bail!("unknown format {}", other),
    }
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_defaults_next_to_input() {
        let mut format = "jpg".to_string();
        let out = resolve_output("/music/track.mp3", None, &mut format, false);
        assert_eq!(out, "/music/track.jpg");

        let out = resolve_output("-", None, &mut format, false);
        assert_eq!(out, "soundsight.jpg");
    }

    #[test]
    fn test_resolve_output_extension_wins() {
        let mut format = "jpg".to_string();
        let out = resolve_output("in.wav", Some("viz.png"), &mut format, true);
        assert_eq!(out, "viz.png");
        assert_eq!(format, "png");
    }

    #[test]
    fn test_resolve_output_appends_default_extension() {
        let mut format = "jpg".to_string();
        let out = resolve_output("in.wav", Some("cover"), &mut format, false);
        assert_eq!(out, "cover.jpg");

        // With an explicit --format the bare name is kept.
        let mut format = "png".to_string();
        let out = resolve_output("in.wav", Some("cover"), &mut format, true);
        assert_eq!(out, "cover");
    }

    #[test]
    fn test_stack_panels_sizes_canvas() {
        let a = RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 255]));
        let b = RgbaImage::from_pixel(4, 3, Rgba([0, 255, 0, 255]));
        let stacked = stack_panels(vec![a, b], 4, 3).unwrap();
        assert_eq!(stacked.dimensions(), (4, 10));
        assert_eq!(*stacked.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        // Gap rows keep the background.
        assert_eq!(*stacked.get_pixel(0, 4), Rgba([0, 0, 0, 255]));
        assert_eq!(*stacked.get_pixel(0, 7), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_encode_image_formats() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let png = encode_image(&img, "png").unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let jpg = encode_image(&img, "jpg").unwrap();
        assert_eq!(&jpg[..2], [0xff, 0xd8]);
        assert!(encode_image(&img, "gif").is_err());
    }
}
