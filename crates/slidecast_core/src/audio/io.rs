//! Audio decode/encode at the process boundary.
//!
//! Utterance clips arrive in whatever container the synthesis service
//! produced. FFmpeg decodes them to mono raw f64 samples at the engine's
//! working rate; finished tracks are written back out as 16-bit PCM WAV
//! for muxing.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::models::{AudioFormat, Waveform};

/// Errors from audio decode/encode operations.
#[derive(Error, Debug)]
pub enum AudioIoError {
    /// Source file does not exist.
    #[error("Audio file not found: {0}")]
    NotFound(String),

    /// FFmpeg/ffprobe invocation failed.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// Decoding produced no samples.
    #[error("No audio samples decoded from {0}")]
    Empty(String),

    /// WAV write failure.
    #[error("Failed to write WAV: {0}")]
    WavWrite(String),
}

/// Result type for audio I/O operations.
pub type AudioIoResult<T> = Result<T, AudioIoError>;

/// Decode an audio file to a mono waveform at the given sample rate.
///
/// The audio is:
/// - Converted to mono (channel downmix)
/// - Resampled to the working sample rate
/// - Output as raw f64 samples
pub fn decode_audio(input_path: &Path, sample_rate: u32) -> AudioIoResult<Waveform> {
    if !input_path.exists() {
        return Err(AudioIoError::NotFound(input_path.display().to_string()));
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i")
        .arg(input_path)
        .arg("-vn") // No video
        .arg("-ac")
        .arg("1") // Mono
        .arg("-ar")
        .arg(sample_rate.to_string());

    // Output raw f64 samples to stdout
    cmd.arg("-f")
        .arg("f64le") // 64-bit float, little endian
        .arg("-acodec")
        .arg("pcm_f64le")
        .arg("pipe:1");

    cmd.stderr(Stdio::null()).stdout(Stdio::piped());

    tracing::debug!("Running FFmpeg: {:?}", cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| AudioIoError::Ffmpeg(format!("Failed to spawn FFmpeg: {}", e)))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| AudioIoError::Ffmpeg("Failed to capture FFmpeg stdout".to_string()))?;

    let mut buffer = Vec::new();
    stdout
        .read_to_end(&mut buffer)
        .map_err(|e| AudioIoError::Ffmpeg(format!("Failed to read FFmpeg output: {}", e)))?;

    let status = child
        .wait()
        .map_err(|e| AudioIoError::Ffmpeg(format!("FFmpeg process error: {}", e)))?;

    if !status.success() {
        return Err(AudioIoError::Ffmpeg(format!(
            "FFmpeg exited with code: {:?}",
            status.code()
        )));
    }

    let samples = bytes_to_f64_samples(&buffer);

    if samples.is_empty() {
        return Err(AudioIoError::Empty(input_path.display().to_string()));
    }

    tracing::debug!(
        "Decoded {} samples ({:.2}s) from {}",
        samples.len(),
        samples.len() as f64 / sample_rate as f64,
        input_path.display()
    );

    Ok(Waveform::new(samples, AudioFormat::mono(sample_rate)))
}

/// Get the duration of a media file using ffprobe.
pub fn probe_duration(input_path: &Path) -> AudioIoResult<f64> {
    if !input_path.exists() {
        return Err(AudioIoError::NotFound(input_path.display().to_string()));
    }

    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(input_path)
        .output()
        .map_err(|e| AudioIoError::Ffmpeg(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(AudioIoError::Ffmpeg(
            "ffprobe failed to get duration".to_string(),
        ));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    duration_str
        .trim()
        .parse::<f64>()
        .map_err(|e| AudioIoError::Ffmpeg(format!("Failed to parse duration: {}", e)))
}

/// Write a waveform as a 16-bit PCM WAV file.
///
/// Samples are clamped to [-1.0, 1.0] before conversion.
pub fn write_wav(output_path: &Path, waveform: &Waveform) -> AudioIoResult<()> {
    let spec = hound::WavSpec {
        channels: waveform.format.channels,
        sample_rate: waveform.format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(output_path, spec)
        .map_err(|e| AudioIoError::WavWrite(e.to_string()))?;

    for &sample in &waveform.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = (clamped * i16::MAX as f64) as i16;
        writer
            .write_sample(value)
            .map_err(|e| AudioIoError::WavWrite(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| AudioIoError::WavWrite(e.to_string()))?;

    Ok(())
}

/// Convert raw bytes to f64 samples (little-endian).
fn bytes_to_f64_samples(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let arr: [u8; 8] = chunk.try_into().unwrap();
            f64::from_le_bytes(arr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn bytes_to_samples_converts_correctly() {
        let val1: f64 = 0.5;
        let val2: f64 = -0.25;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&val1.to_le_bytes());
        bytes.extend_from_slice(&val2.to_le_bytes());

        let samples = bytes_to_f64_samples(&bytes);

        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.5).abs() < 1e-10);
        assert!((samples[1] - (-0.25)).abs() < 1e-10);
    }

    #[test]
    fn bytes_to_samples_handles_partial() {
        // Only 10 bytes - should get 1 sample (8 bytes), ignore remainder
        let bytes = vec![0u8; 10];
        let samples = bytes_to_f64_samples(&bytes);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn decode_rejects_missing_file() {
        let result = decode_audio(Path::new("/nonexistent/file.wav"), 24_000);
        assert!(matches!(result, Err(AudioIoError::NotFound(_))));
    }

    #[test]
    fn probe_rejects_missing_file() {
        let result = probe_duration(Path::new("/nonexistent/file.wav"));
        assert!(matches!(result, Err(AudioIoError::NotFound(_))));
    }

    #[test]
    fn wav_round_trip_preserves_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("out.wav");

        let samples: Vec<f64> = (0..2400)
            .map(|i| 0.5 * (i as f64 * 0.05).sin())
            .collect();
        let waveform = Waveform::new(samples.clone(), AudioFormat::mono(24_000));

        write_wav(&path, &waveform).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.spec().channels, 1);

        let decoded: Vec<f64> = reader
            .samples::<i16>()
            .map(|s| s.unwrap() as f64 / i16::MAX as f64)
            .collect();
        assert_eq!(decoded.len(), waveform.sample_count());

        // 16-bit quantization error bound
        for (a, b) in samples.iter().zip(&decoded) {
            assert!((a - b).abs() < 1.0 / 16_384.0);
        }
    }

    #[test]
    fn wav_write_clamps_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loud.wav");

        let waveform = Waveform::new(vec![2.0, -3.0], AudioFormat::mono(24_000));
        write_wav(&path, &waveform).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded[0], i16::MAX);
        assert_eq!(decoded[1], -i16::MAX);
    }
}
