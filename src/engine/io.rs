//! Audio file I/O
//!
//! Handles importing and exporting WAV files. Everything is converted to the
//! internal 48kHz 32-bit float format on import. Sample rate conversion uses
//! linear interpolation.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::engine::buffer::{AudioBuffer, ChannelLayout, INTERNAL_SAMPLE_RATE};
use crate::error::{Result, StudioError};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Target sample rate (default: 48000)
    pub sample_rate: u32,
    /// Bit depth: 16, 24, or 32 (default: 24)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat {
            sample_rate: INTERNAL_SAMPLE_RATE,
            bit_depth: 24,
        }
    }
}

impl ExportFormat {
    pub fn new(sample_rate: u32, bit_depth: u16) -> Self {
        ExportFormat {
            sample_rate,
            bit_depth,
        }
    }

    /// CD quality (44.1kHz, 16-bit)
    pub fn cd_quality() -> Self {
        Self::new(44100, 16)
    }
}

/// Import a WAV file and convert to internal format
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - More than 2 channels or an unknown bit depth
/// * `EmptyAudio` - The file decodes to zero frames
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(StudioError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| StudioError::InvalidAudio {
        reason: format!("Failed to open WAV file {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    if ChannelLayout::from_count(channels).is_none() {
        return Err(StudioError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let samples_f32 = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if samples_f32.len() < channels {
        return Err(StudioError::EmptyAudio);
    }

    let channel_data = deinterleave(&samples_f32, channels);
    let resampled = if spec.sample_rate != INTERNAL_SAMPLE_RATE {
        debug!(
            "Resampling {} from {}Hz to {}Hz",
            path.display(),
            spec.sample_rate,
            INTERNAL_SAMPLE_RATE
        );
        resample_channels(&channel_data, spec.sample_rate, INTERNAL_SAMPLE_RATE)
    } else {
        channel_data
    };

    AudioBuffer::from_channels(resampled, INTERNAL_SAMPLE_RATE)
}

/// Export an AudioBuffer to a WAV file
///
/// Resamples if the target sample rate differs from the buffer's rate.
/// Samples are clamped to [-1, 1] for integer formats.
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    if !matches!(format.bit_depth, 16 | 24 | 32) {
        return Err(StudioError::UnsupportedFormat {
            format: format!("{}-bit audio (only 16, 24, 32 supported)", format.bit_depth),
        });
    }

    let export_data = if format.sample_rate != buffer.sample_rate {
        resample_channels(&buffer.samples, buffer.sample_rate, format.sample_rate)
    } else {
        buffer.samples.clone()
    };
    let interleaved = interleave(&export_data);

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WavWriter::create(path, spec).map_err(wav_write_error)?;

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(wav_write_error)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(wav_write_error)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample).map_err(wav_write_error)?;
            }
        }
    }

    writer.finalize().map_err(wav_write_error)?;
    Ok(())
}

/// Generate a mono sine test tone
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    AudioBuffer {
        samples: vec![(0..num_samples)
            .map(|i| (angular_freq * i as f32).sin())
            .collect()],
        sample_rate,
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn wav_write_error(e: hound::Error) -> StudioError {
    match e {
        hound::Error::IoError(io) => StudioError::Io(io),
        other => StudioError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let scale = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => {
            return reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| StudioError::InvalidAudio {
                    reason: format!("Failed to read float samples: {}", e),
                    source: Some(Box::new(e)),
                });
        }
        (SampleFormat::Int, 8) => 128.0,
        (SampleFormat::Int, 16) => 32768.0,
        (SampleFormat::Int, 24) => 8388608.0,
        (SampleFormat::Int, 32) => 2147483648.0,
        (SampleFormat::Int, bits) => {
            return Err(StudioError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits),
            });
        }
    };

    // hound widens every integer width into i32
    reader
        .samples::<i32>()
        .map(|s| s.map(|v| v as f32 / scale))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| StudioError::InvalidAudio {
            reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
            source: Some(Box::new(e)),
        })
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            result[ch].push(sample);
        }
    }

    result
}

/// Interleave channels from [[L,L,...], [R,R,...]] to [L,R,L,R,...]
fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = channels.first() else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(first.len() * channels.len());
    for frame in 0..first.len() {
        for channel in channels {
            result.push(channel[frame]);
        }
    }

    result
}

/// Resample audio channels to a different sample rate
pub fn resample_channels(
    channels: &[Vec<f32>],
    source_rate: u32,
    target_rate: u32,
) -> Vec<Vec<f32>> {
    let ratio = target_rate as f64 / source_rate as f64;

    channels
        .iter()
        .map(|channel| resample_linear(channel, ratio))
        .collect()
}

/// Linear interpolation resampling
///
/// Linear interpolation aliases when downsampling; acceptable for speech.
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ============================================================================
// Tests
// ============================================================================
