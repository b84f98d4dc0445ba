//! Audio Buffer Management
//!
//! Provides the core audio buffer type shared by the enhancer, the style
//! models and the feature extractor. All internal processing uses
//! 48kHz/32-bit float, non-interleaved.

use crate::error::{Result, StudioError};

// ============================================================================
// Constants
// ============================================================================

/// Internal sample rate for all processing (48kHz)
pub const INTERNAL_SAMPLE_RATE: u32 = 48000;

/// Threshold below which audio is considered silent (-80dBFS)
pub const SILENCE_THRESHOLD_DB: f32 = -80.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// RMS level of a slice of samples in dB
///
/// Returns -f32::INFINITY for empty or silent input.
pub fn slice_rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    linear_to_db((sum_squares / samples.len() as f64).sqrt() as f32)
}

/// Calculate the RMS level of an audio buffer in dB
///
/// Returns -f32::INFINITY for empty or silent buffers.
pub fn calculate_rms(buffer: &AudioBuffer) -> f32 {
    let total_samples = buffer.num_channels() * buffer.num_samples();
    if total_samples == 0 {
        return f32::NEG_INFINITY;
    }

    let sum_squares: f64 = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();

    let rms = (sum_squares / total_samples as f64).sqrt() as f32;
    linear_to_db(rms)
}

/// Calculate the peak level of an audio buffer in dB
///
/// Returns -f32::INFINITY for empty buffers.
pub fn calculate_peak(buffer: &AudioBuffer) -> f32 {
    let peak = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max);

    linear_to_db(peak)
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    #[default]
    Mono,
    /// Two channels (stereo: left, right)
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Core audio buffer type
///
/// Stores audio as non-interleaved 32-bit floating point samples.
/// Each channel is a separate `Vec<f32>`.
///
/// # Example
/// ```
/// use voice_studio::engine::buffer::{AudioBuffer, ChannelLayout, INTERNAL_SAMPLE_RATE};
///
/// // Create a 1-second stereo buffer
/// let buffer = AudioBuffer::new(INTERNAL_SAMPLE_RATE as usize, ChannelLayout::Stereo);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz (default: 48000)
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer with the specified number of samples and layout
    pub fn new(num_samples: usize, layout: ChannelLayout) -> Self {
        let num_channels = layout.num_channels();
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate: INTERNAL_SAMPLE_RATE,
        }
    }

    /// Wrap existing per-channel data
    ///
    /// Fails if there are not one or two channels or if channel lengths differ.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if ChannelLayout::from_count(samples.len()).is_none() {
            return Err(StudioError::UnsupportedFormat {
                format: format!("{}-channel audio (only mono/stereo supported)", samples.len()),
            });
        }
        let first_len = samples[0].len();
        if samples.iter().any(|ch| ch.len() != first_len) {
            return Err(StudioError::InvalidAudio {
                reason: "channels have different lengths".to_string(),
                source: None,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// Returns an error if the data length isn't a multiple of the channel count.
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(StudioError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_samples = self.len();
        let mut interleaved = Vec::with_capacity(self.channels() * num_samples);

        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Alias for channels()
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Alias for len()
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.len()
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get the channel layout
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Average all channels into a single mono signal
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels() {
            0 => Vec::new(),
            1 => self.samples[0].clone(),
            n => (0..self.len())
                .map(|i| self.samples.iter().map(|ch| ch[i]).sum::<f32>() / n as f32)
                .collect(),
        }
    }

    /// RMS level of each consecutive `frame_len`-sample frame, in dB
    ///
    /// Channels are mixed to mono first. A trailing partial frame is included.
    pub fn frame_rms_db(&self, frame_len: usize) -> Vec<f32> {
        if frame_len == 0 {
            return Vec::new();
        }
        self.to_mono().chunks(frame_len).map(slice_rms_db).collect()
    }

    /// Check if all samples are finite (not NaN or Infinity)
    ///
    /// Used for DSP overflow detection.
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Clamp all samples to the valid range [-1.0, 1.0]
    pub fn clamp(&mut self) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample = sample.clamp(-1.0, 1.0);
            }
        }
    }

    /// Apply gain in decibels to all samples
    pub fn apply_gain(&mut self, gain_db: f32) {
        let gain_linear = db_to_linear(gain_db);
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample *= gain_linear;
            }
        }
    }

    /// Scale the buffer so its peak sits at `target_db`
    ///
    /// Silent buffers are left untouched.
    pub fn normalize_peak(&mut self, target_db: f32) {
        let peak_db = calculate_peak(self);
        if peak_db.is_finite() && peak_db > SILENCE_THRESHOLD_DB {
            self.apply_gain(target_db - peak_db);
        }
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Mono)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_buffer(samples: Vec<Vec<f32>>) -> AudioBuffer {
        AudioBuffer {
            samples,
            sample_rate: INTERNAL_SAMPLE_RATE,
        }
    }

    #[test]
    fn test_db_to_linear() {
        assert_relative_eq!(db_to_linear(0.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(db_to_linear(-6.0206), 0.5, epsilon = 1e-4);
        assert_relative_eq!(db_to_linear(-20.0), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_linear_to_db() {
        assert_relative_eq!(linear_to_db(1.0), 0.0, epsilon = 1e-6);
        assert_relative_eq!(linear_to_db(0.1), -20.0, epsilon = 1e-4);
        assert!(linear_to_db(0.0).is_infinite() && linear_to_db(0.0).is_sign_negative());
    }

    #[test]
    fn test_calculate_rms_sine() {
        // Sine wave with amplitude 1.0 has RMS of 1/sqrt(2) ~= -3.01 dB
        let num_samples = INTERNAL_SAMPLE_RATE as usize;
        let samples: Vec<f32> = (0..num_samples)
            .map(|i| {
                let t = i as f32 / INTERNAL_SAMPLE_RATE as f32;
                (2.0 * std::f32::consts::PI * 1000.0 * t).sin()
            })
            .collect();
        let buffer = create_test_buffer(vec![samples]);
        assert!((calculate_rms(&buffer) - (-3.01)).abs() < 0.1);
    }

    #[test]
    fn test_calculate_rms_empty() {
        let rms = calculate_rms(&create_test_buffer(vec![]));
        assert!(rms.is_infinite() && rms.is_sign_negative());
    }

    #[test]
    fn test_calculate_peak_negative() {
        let mut samples = vec![0.0; 1000];
        samples[500] = -0.5;
        let peak = calculate_peak(&create_test_buffer(vec![samples]));
        assert!((peak - (-6.02)).abs() < 0.1);
    }

    #[test]
    fn test_from_channels_rejects_mismatched_lengths() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 10], vec![0.0; 9]], 48000);
        assert!(matches!(result, Err(StudioError::InvalidAudio { .. })));
    }

    #[test]
    fn test_from_channels_rejects_surround() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 4]; 6], 48000);
        assert!(matches!(result, Err(StudioError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_buffer_from_interleaved_stereo() {
        let interleaved = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let buffer =
            AudioBuffer::from_interleaved(&interleaved, ChannelLayout::Stereo, 44100).unwrap();
        assert_eq!(buffer.channel(0), &[0.1, 0.3, 0.5]);
        assert_eq!(buffer.channel(1), &[0.2, 0.4, 0.6]);
        assert_eq!(buffer.to_interleaved(), interleaved);
    }

    #[test]
    fn test_buffer_from_interleaved_invalid() {
        let result = AudioBuffer::from_interleaved(&[0.1, 0.2, 0.3], ChannelLayout::Stereo, 48000);
        assert!(result.is_err());
    }

    #[test]
    fn test_to_mono_averages_channels() {
        let buffer = create_test_buffer(vec![vec![1.0, 0.0], vec![0.0, -1.0]]);
        assert_eq!(buffer.to_mono(), vec![0.5, -0.5]);
    }

    #[test]
    fn test_frame_rms_db_includes_partial_frame() {
        let buffer = create_test_buffer(vec![vec![1.0; 10]]);
        let frames = buffer.frame_rms_db(4);
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|db| db.abs() < 1e-4));
    }

    #[test]
    fn test_normalize_peak() {
        let mut buffer = create_test_buffer(vec![vec![0.25, -0.5, 0.1]]);
        buffer.normalize_peak(0.0);
        assert_relative_eq!(calculate_peak(&buffer), 0.0, epsilon = 1e-3);

        let mut silent = create_test_buffer(vec![vec![0.0; 8]]);
        silent.normalize_peak(-1.0);
        assert!(silent.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_buffer_is_finite() {
        let mut buffer = create_test_buffer(vec![vec![0.5, -0.5]]);
        assert!(buffer.is_finite());
        buffer.channel_mut(0)[1] = f32::NAN;
        assert!(!buffer.is_finite());
    }
}
