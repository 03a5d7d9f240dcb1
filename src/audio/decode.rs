//! Audio decoding via symphonia
//!
//! Probes the container, decodes the first audio track, and mixes
//! interleaved channels down to mono by averaging.

use super::Audio;
use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an audio file to mono samples.
pub fn decode_file(path: &Path) -> Result<Audio> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open audio file: {:?}", path))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    decode_stream(mss, hint)
}

/// Decode in-memory audio data (e.g. read from stdin) to mono samples.
pub fn decode_bytes(data: &[u8]) -> Result<Audio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());
    decode_stream(mss, Hint::new())
}

fn decode_stream(mss: MediaSourceStream, hint: Hint) -> Result<Audio> {
    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .context("failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("no audio track found")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("no sample rate in audio track")?;

    let dec_opts = DecoderOptions::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .context("failed to create audio decoder")?;

    let mut samples: Vec<f64> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("error reading packet: {:?}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("error decoding packet: {:?}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let duration = decoded.capacity() as u64;

        let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let channels = spec.channels.count();
        if channels > 1 {
            for chunk in sample_buf.samples().chunks(channels) {
                let mono: f32 = chunk.iter().sum::<f32>() / channels as f32;
                samples.push(mono as f64);
            }
        } else {
            samples.extend(sample_buf.samples().iter().map(|&s| s as f64));
        }
    }

    log::debug!(
        "decoded {} samples ({:.1}s) at {} Hz",
        samples.len(),
        samples.len() as f64 / sample_rate as f64,
        sample_rate
    );

    Ok(Audio { sample_rate, samples })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm16_wav(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_pcm16_wav() {
        let raw: Vec<i16> = (0..64).map(|i| (i * 256) as i16).collect();
        let audio = decode_bytes(&pcm16_wav(8000, &raw)).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples.len(), 64);
        assert!((audio.samples[32] - raw[32] as f64 / 32768.0).abs() < 1e-3);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_bytes(b"definitely not audio data").is_err());
    }

    #[test]
    fn test_decode_requires_file() {
        assert!(decode_file(Path::new("/nonexistent/file.mp3")).is_err());
    }
}
