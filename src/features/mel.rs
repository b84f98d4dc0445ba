//! Log mel spectrogram computation
//!
//! STFT with a periodic Hann window and reflect padding, a triangular
//! Slaney-scale mel filterbank and natural-log compression.

use std::f32::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// Floor applied before taking the log of mel energies
const LOG_FLOOR: f32 = 1e-5;

/// Configuration for mel spectrogram computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelConfig {
    /// Analysis sample rate; input audio is resampled to this (default: 22050)
    pub sample_rate: u32,
    /// FFT size (default: 1024)
    pub n_fft: usize,
    /// Hop length between frames (default: 256)
    pub hop_length: usize,
    /// Number of mel bands (default: 80)
    pub n_mels: usize,
    /// Lowest filterbank frequency in Hz
    pub fmin: f32,
    /// Highest filterbank frequency in Hz (defaults to sample_rate / 2)
    pub fmax: Option<f32>,
}

impl Default for MelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            n_fft: 1024,
            hop_length: 256,
            n_mels: 80,
            fmin: 0.0,
            fmax: None,
        }
    }
}

impl MelConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |param: &str, value: String, expected: &str| StudioError::InvalidParameter {
            param: param.to_string(),
            value,
            expected: expected.to_string(),
        };

        if self.sample_rate == 0 {
            return Err(invalid("sample_rate", "0".into(), "a positive rate"));
        }
        if self.n_fft < 16 {
            return Err(invalid("n_fft", self.n_fft.to_string(), "at least 16"));
        }
        if self.hop_length == 0 || self.hop_length > self.n_fft {
            return Err(invalid("hop_length", self.hop_length.to_string(), "1 to n_fft"));
        }
        if self.n_mels == 0 {
            return Err(invalid("n_mels", "0".into(), "at least 1 mel band"));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        let fmax = self.fmax.unwrap_or(nyquist);
        if !(0.0..fmax).contains(&self.fmin) || fmax > nyquist {
            return Err(invalid(
                "fmin/fmax",
                format!("{}/{}", self.fmin, fmax),
                "0 <= fmin < fmax <= sample_rate / 2",
            ));
        }
        Ok(())
    }
}

/// Log mel spectrogram of one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelSpectrogram {
    /// Log mel energies shaped `[n_frames][n_mels]`
    pub frames: Vec<Vec<f32>>,
    pub n_mels: usize,
    pub sample_rate: u32,
    pub hop_length: usize,
}

impl MelSpectrogram {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Duration covered by the frames in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.frames.len() * self.hop_length) as f64 / self.sample_rate as f64
    }
}

/// Precomputed window and filterbank for a `MelConfig`
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    config: MelConfig,
    mel_basis: Vec<Vec<f32>>,
    window: Vec<f32>,
}

impl MelFilterbank {
    pub fn new(config: MelConfig) -> Result<Self> {
        config.validate()?;
        let fmax = config.fmax.unwrap_or(config.sample_rate as f32 / 2.0);
        let mel_basis = create_mel_filterbank(
            config.sample_rate,
            config.n_fft,
            config.n_mels,
            config.fmin,
            fmax,
        );
        let window = hann_window(config.n_fft);

        Ok(Self {
            config,
            mel_basis,
            window,
        })
    }

    pub fn config(&self) -> &MelConfig {
        &self.config
    }

    /// Number of frames produced for `num_samples` input samples
    pub fn num_frames(&self, num_samples: usize) -> usize {
        num_samples / self.config.hop_length + 1
    }

    /// Compute the log mel spectrogram of mono samples at the config rate
    pub fn compute_log(&self, samples: &[f32]) -> MelSpectrogram {
        let frames = self
            .stft_power(samples)
            .iter()
            .map(|power| {
                self.mel_basis
                    .iter()
                    .map(|filter| {
                        let energy: f32 = filter.iter().zip(power).map(|(f, p)| f * p).sum();
                        energy.max(LOG_FLOOR).ln()
                    })
                    .collect()
            })
            .collect();

        MelSpectrogram {
            frames,
            n_mels: self.config.n_mels,
            sample_rate: self.config.sample_rate,
            hop_length: self.config.hop_length,
        }
    }

    /// Power spectrum of each centred, windowed frame
    fn stft_power(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let padded = reflect_pad(samples, n_fft / 2);

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];

        (0..self.num_frames(samples.len()))
            .map(|i| {
                let start = i * hop;
                for (j, slot) in buffer.iter_mut().enumerate() {
                    let sample = padded.get(start + j).copied().unwrap_or(0.0);
                    *slot = Complex::new(sample * self.window[j], 0.0);
                }
                fft.process(&mut buffer);
                buffer[..=n_fft / 2].iter().map(|c| c.norm_sqr()).collect()
            })
            .collect()
    }
}

/// Mirror `pad` samples onto each end, excluding the edge sample itself
fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let len = samples.len();
    let mirror = |offset: usize| -> f32 {
        if len < 2 {
            return 0.0;
        }
        // Bounce back and forth for signals shorter than the pad
        let period = 2 * (len - 1);
        let pos = offset % period;
        samples[if pos < len { pos } else { period - pos }]
    };

    let mut padded = Vec::with_capacity(len + 2 * pad);
    padded.extend((1..=pad).rev().map(mirror));
    padded.extend_from_slice(samples);
    padded.extend((1..=pad).map(|i| mirror(len.saturating_sub(1) + i)));
    padded
}

/// Hz to mel (Slaney / O'Shaughnessy scale)
fn hz_to_mel(f: f32) -> f32 {
    const F_SP: f32 = 200.0 / 3.0;
    const MIN_LOG_HZ: f32 = 1000.0;
    const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;
    const LOGSTEP: f32 = 0.068_751_74;

    if f < MIN_LOG_HZ {
        f / F_SP
    } else {
        MIN_LOG_MEL + (f / MIN_LOG_HZ).ln() / LOGSTEP
    }
}

/// Mel to Hz (Slaney / O'Shaughnessy scale)
fn mel_to_hz(m: f32) -> f32 {
    const F_SP: f32 = 200.0 / 3.0;
    const MIN_LOG_HZ: f32 = 1000.0;
    const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;
    const LOGSTEP: f32 = 0.068_751_74;

    if m < MIN_LOG_MEL {
        m * F_SP
    } else {
        MIN_LOG_HZ * ((m - MIN_LOG_MEL) * LOGSTEP).exp()
    }
}

/// Triangular filters evenly spaced on the mel scale, shaped `[n_mels][n_fft/2 + 1]`
fn create_mel_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin: f32,
    fmax: f32,
) -> Vec<Vec<f32>> {
    let n_freqs = n_fft / 2 + 1;
    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let hz_points: Vec<f32> = (0..=n_mels + 1)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
        .collect();
    let bin_hz = sample_rate as f32 / n_fft as f32;

    (0..n_mels)
        .map(|m| {
            let (lower, center, upper) = (hz_points[m], hz_points[m + 1], hz_points[m + 2]);
            (0..n_freqs)
                .map(|bin| {
                    let freq = bin as f32 * bin_hz;
                    if freq >= lower && freq <= center && center > lower {
                        (freq - lower) / (center - lower)
                    } else if freq > center && freq <= upper && upper > center {
                        (upper - freq) / (upper - center)
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

/// Periodic Hann window
fn hann_window(length: usize) -> Vec<f32> {
    (0..length)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / length as f32).cos()))
        .collect()
}
