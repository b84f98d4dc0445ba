//! Compressor effect
//!
//! Feed-forward dynamics processor with peak detection, soft knee,
//! attack/release smoothing and makeup gain. Stereo channels are linked.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::effect::{time_coefficient, Effect, EffectParams};
use crate::engine::{db_to_linear, linear_to_db, AudioBuffer, INTERNAL_SAMPLE_RATE};
use crate::error::{Result, StudioError};
use crate::impl_effect_common;

/// Compressor parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorParams {
    /// Threshold level in dB (-60 to 0 dB)
    pub threshold_db: f32,
    /// Compression ratio (1.0 to 20.0)
    pub ratio: f32,
    /// Attack time in milliseconds (0.1 to 100 ms)
    pub attack_ms: f32,
    /// Release time in milliseconds (10 to 1000 ms)
    pub release_ms: f32,
    /// Knee width in dB (0 = hard knee, up to 12 dB)
    pub knee_db: f32,
    /// Makeup gain in dB (0 to 24 dB)
    pub makeup_gain_db: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            knee_db: 0.0,
            makeup_gain_db: 0.0,
        }
    }
}

impl CompressorParams {
    /// Validate parameters against their ranges
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, f32, f32, f32, &str); 6] = [
            ("threshold_db", self.threshold_db, -60.0, 0.0, "-60 to 0 dB"),
            ("ratio", self.ratio, 1.0, 20.0, "1.0 to 20.0"),
            ("attack_ms", self.attack_ms, 0.1, 100.0, "0.1 to 100 ms"),
            ("release_ms", self.release_ms, 10.0, 1000.0, "10 to 1000 ms"),
            ("knee_db", self.knee_db, 0.0, 12.0, "0 to 12 dB"),
            ("makeup_gain_db", self.makeup_gain_db, 0.0, 24.0, "0 to 24 dB"),
        ];

        for (param, value, min, max, expected) in checks {
            if !(min..=max).contains(&value) {
                return Err(StudioError::InvalidParameter {
                    param: param.to_string(),
                    value: value.to_string(),
                    expected: expected.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Compressor dynamics processor
#[derive(Debug, Clone)]
pub struct Compressor {
    common: EffectParams,
    params: CompressorParams,
    sample_rate: u32,
    attack_coeff: f32,
    release_coeff: f32,
    /// Current smoothed gain (linear, <= 1.0)
    gain: f32,
}

impl Compressor {
    /// Create a new compressor with validated parameters
    pub fn with_params(params: CompressorParams) -> Result<Self> {
        params.validate()?;
        let mut comp = Self {
            common: EffectParams::default(),
            params,
            sample_rate: INTERNAL_SAMPLE_RATE,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            gain: 1.0,
        };
        comp.update_coefficients();
        Ok(comp)
    }

    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    fn update_coefficients(&mut self) {
        self.attack_coeff = time_coefficient(self.params.attack_ms, self.sample_rate);
        self.release_coeff = time_coefficient(self.params.release_ms, self.sample_rate);
    }

    /// Static gain curve: gain reduction in dB (<= 0) for an input level
    pub fn compute_gain_reduction_db(&self, input_db: f32) -> f32 {
        let threshold = self.params.threshold_db;
        let ratio = self.params.ratio;
        let knee = self.params.knee_db;
        let overshoot = input_db - threshold;

        if knee > 0.0 && overshoot.abs() <= knee / 2.0 {
            let x = overshoot + knee / 2.0;
            (1.0 / ratio - 1.0) * x * x / (2.0 * knee)
        } else if overshoot > 0.0 {
            overshoot * (1.0 / ratio - 1.0)
        } else {
            0.0
        }
    }
}

impl Effect for Compressor {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        if buffer.sample_rate != self.sample_rate {
            self.prepare(buffer.sample_rate);
        }
        let makeup = db_to_linear(self.params.makeup_gain_db);
        let num_channels = buffer.num_channels();

        for frame in 0..buffer.num_samples() {
            let level = (0..num_channels)
                .map(|ch| buffer.samples[ch][frame].abs())
                .fold(0.0_f32, f32::max);

            let target = db_to_linear(self.compute_gain_reduction_db(linear_to_db(level)));
            let coeff = if target < self.gain {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.gain = coeff * self.gain + (1.0 - coeff) * target;

            let total_gain = self.gain * makeup;
            for ch in 0..num_channels {
                buffer.samples[ch][frame] *= total_gain;
            }
        }
    }

    fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.gain = 1.0;
    }

    fn get_params(&self) -> Value {
        serde_json::to_value(&self.params).unwrap_or(Value::Null)
    }

    impl_effect_common!("compressor");
}
