//! Parametric EQ
//!
//! Multi-band equalizer built from cascaded biquad filters.
//! Supports peak, shelf, and pass filters.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::effect::{Effect, EffectParams};
use crate::engine::AudioBuffer;
use crate::error::{Result, StudioError};
use crate::impl_effect_common;

/// Maximum number of EQ bands
pub const MAX_BANDS: usize = 8;

/// Filter type for EQ bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Bell curve boost/cut
    #[default]
    Peak,
    /// Boost/cut below frequency
    LowShelf,
    /// Boost/cut above frequency
    HighShelf,
    /// Remove above frequency
    LowPass,
    /// Remove below frequency
    HighPass,
}

/// Normalized biquad coefficients (a0 = 1)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Audio EQ Cookbook formulas
    fn calculate(band: &EQBand, sample_rate: f64) -> Self {
        let freq = (band.frequency as f64).clamp(20.0, sample_rate / 2.0 - 1.0);
        let q = (band.q as f64).clamp(0.1, 10.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a = 10.0_f64.powf(band.gain_db as f64 / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match band.filter_type {
            FilterType::Peak => (
                1.0 + alpha * a,
                -2.0 * cos_w0,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w0,
                1.0 - alpha / a,
            ),
            FilterType::LowShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterType::HighShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterType::LowPass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Biquad filter state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    /// Direct Form I
    fn process(&mut self, input: f64, c: &BiquadCoeffs) -> f64 {
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Single EQ band configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EQBand {
    /// Center/corner frequency in Hz (20-20000)
    pub frequency: f32,
    /// Gain in dB (-24 to +24), ignored by pass filters
    pub gain_db: f32,
    /// Q factor (0.1 to 10.0)
    pub q: f32,
    pub filter_type: FilterType,
}

impl EQBand {
    pub fn new(frequency: f32, gain_db: f32, q: f32, filter_type: FilterType) -> Self {
        Self {
            frequency,
            gain_db,
            q,
            filter_type,
        }
    }

    pub fn peak(frequency: f32, gain_db: f32, q: f32) -> Self {
        Self::new(frequency, gain_db, q, FilterType::Peak)
    }

    pub fn low_shelf(frequency: f32, gain_db: f32) -> Self {
        Self::new(frequency, gain_db, 0.707, FilterType::LowShelf)
    }

    pub fn high_shelf(frequency: f32, gain_db: f32) -> Self {
        Self::new(frequency, gain_db, 0.707, FilterType::HighShelf)
    }

    pub fn low_pass(frequency: f32) -> Self {
        Self::new(frequency, 0.0, 0.707, FilterType::LowPass)
    }

    pub fn high_pass(frequency: f32) -> Self {
        Self::new(frequency, 0.0, 0.707, FilterType::HighPass)
    }

    /// Validate band parameters
    pub fn validate(&self) -> Result<()> {
        if !(20.0..=20000.0).contains(&self.frequency) {
            return Err(StudioError::InvalidParameter {
                param: "frequency".to_string(),
                value: self.frequency.to_string(),
                expected: "20-20000 Hz".to_string(),
            });
        }
        if !(-24.0..=24.0).contains(&self.gain_db) {
            return Err(StudioError::InvalidParameter {
                param: "gain_db".to_string(),
                value: self.gain_db.to_string(),
                expected: "-24 to +24 dB".to_string(),
            });
        }
        if !(0.1..=10.0).contains(&self.q) {
            return Err(StudioError::InvalidParameter {
                param: "q".to_string(),
                value: self.q.to_string(),
                expected: "0.1 to 10.0".to_string(),
            });
        }
        Ok(())
    }
}

/// Parametric equalizer with up to [`MAX_BANDS`] bands
#[derive(Debug, Clone)]
pub struct ParametricEQ {
    common: EffectParams,
    bands: Vec<EQBand>,
    sample_rate: u32,
    coeffs: Vec<BiquadCoeffs>,
    /// Filter state indexed as [channel][band]
    states: Vec<Vec<BiquadState>>,
}

impl ParametricEQ {
    /// Create an EQ from a set of bands
    pub fn with_bands(bands: Vec<EQBand>) -> Result<Self> {
        if bands.len() > MAX_BANDS {
            return Err(StudioError::InvalidParameter {
                param: "bands".to_string(),
                value: bands.len().to_string(),
                expected: format!("at most {} bands", MAX_BANDS),
            });
        }
        for band in &bands {
            band.validate()?;
        }

        let mut eq = Self {
            common: EffectParams::default(),
            bands,
            sample_rate: crate::engine::INTERNAL_SAMPLE_RATE,
            coeffs: Vec::new(),
            states: Vec::new(),
        };
        eq.update_coefficients();
        Ok(eq)
    }

    pub fn bands(&self) -> &[EQBand] {
        &self.bands
    }

    fn update_coefficients(&mut self) {
        let sample_rate = self.sample_rate as f64;
        self.coeffs = self
            .bands
            .iter()
            .map(|band| BiquadCoeffs::calculate(band, sample_rate))
            .collect();
    }
}

impl Effect for ParametricEQ {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        if buffer.sample_rate != self.sample_rate {
            self.prepare(buffer.sample_rate);
        }
        let num_channels = buffer.num_channels();
        if self.states.len() != num_channels {
            self.states = vec![vec![BiquadState::default(); self.bands.len()]; num_channels];
        }

        for (ch, states) in self.states.iter_mut().enumerate() {
            for sample in buffer.channel_mut(ch).iter_mut() {
                let mut value = *sample as f64;
                for (state, coeffs) in states.iter_mut().zip(&self.coeffs) {
                    value = state.process(value, coeffs);
                }
                *sample = value as f32;
            }
        }
    }

    fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
        self.reset();
    }

    fn reset(&mut self) {
        self.states.clear();
    }

    fn get_params(&self) -> Value {
        serde_json::json!({ "bands": self.bands })
    }

    impl_effect_common!("parametric_eq");
}
