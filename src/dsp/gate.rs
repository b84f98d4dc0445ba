//! Noise Gate
//!
//! Attenuates audio below a threshold, removing background noise between
//! phrases. Envelope follower with hysteresis and a hold timer so the gate
//! doesn't chatter on signals hovering around the threshold.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::effect::{time_coefficient, Effect, EffectParams};
use crate::engine::{db_to_linear, AudioBuffer, INTERNAL_SAMPLE_RATE};
use crate::error::{Result, StudioError};
use crate::impl_effect_common;

/// Envelope follower time constants (level detection, not gain smoothing)
const DETECTOR_ATTACK_MS: f32 = 0.1;
const DETECTOR_RELEASE_MS: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Closed,
    Open,
    Hold,
}

/// Gate parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateParams {
    /// Threshold in dB (-80 to 0)
    pub threshold_db: f32,
    /// Attack time in ms (0.1 to 50)
    pub attack_ms: f32,
    /// Release time in ms (10 to 500)
    pub release_ms: f32,
    /// Hold time in ms (0 to 100)
    pub hold_ms: f32,
    /// Attenuation when closed in dB (-80 = full gate, 0 = no effect)
    pub range_db: f32,
    /// Distance between open and close thresholds in dB
    pub hysteresis_db: f32,
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            attack_ms: 1.0,
            release_ms: 50.0,
            hold_ms: 10.0,
            range_db: -80.0,
            hysteresis_db: 2.0,
        }
    }
}

impl GateParams {
    /// Validate parameters are within range
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, f32, f32, f32, &str); 6] = [
            ("threshold_db", self.threshold_db, -80.0, 0.0, "-80 to 0 dB"),
            ("attack_ms", self.attack_ms, 0.1, 50.0, "0.1 to 50 ms"),
            ("release_ms", self.release_ms, 10.0, 500.0, "10 to 500 ms"),
            ("hold_ms", self.hold_ms, 0.0, 100.0, "0 to 100 ms"),
            ("range_db", self.range_db, -80.0, 0.0, "-80 to 0 dB"),
            ("hysteresis_db", self.hysteresis_db, 0.0, 12.0, "0 to 12 dB"),
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

/// Noise gate effect
#[derive(Debug, Clone)]
pub struct Gate {
    common: EffectParams,
    params: GateParams,
    sample_rate: u32,
    state: GateState,
    /// Envelope follower value (linear)
    envelope: f32,
    /// Current gain (linear)
    current_gain: f32,
    hold_counter: usize,
    detector_attack: f32,
    detector_release: f32,
    gain_attack: f32,
    gain_release: f32,
    hold_samples: usize,
    range_linear: f32,
    open_threshold: f32,
    close_threshold: f32,
}

impl Gate {
    /// Create a gate with validated parameters
    pub fn with_params(params: GateParams) -> Result<Self> {
        params.validate()?;
        let mut gate = Self {
            common: EffectParams::default(),
            params,
            sample_rate: INTERNAL_SAMPLE_RATE,
            state: GateState::Closed,
            envelope: 0.0,
            current_gain: 0.0,
            hold_counter: 0,
            detector_attack: 0.0,
            detector_release: 0.0,
            gain_attack: 0.0,
            gain_release: 0.0,
            hold_samples: 0,
            range_linear: 0.0,
            open_threshold: 0.0,
            close_threshold: 0.0,
        };
        gate.update_coefficients();
        gate.reset();
        Ok(gate)
    }

    pub fn params(&self) -> &GateParams {
        &self.params
    }

    fn update_coefficients(&mut self) {
        self.open_threshold = db_to_linear(self.params.threshold_db);
        self.close_threshold = db_to_linear(self.params.threshold_db - self.params.hysteresis_db);
        self.range_linear = db_to_linear(self.params.range_db);

        self.detector_attack = time_coefficient(DETECTOR_ATTACK_MS, self.sample_rate);
        self.detector_release = time_coefficient(DETECTOR_RELEASE_MS, self.sample_rate);
        self.gain_attack = time_coefficient(self.params.attack_ms, self.sample_rate);
        self.gain_release = time_coefficient(self.params.release_ms, self.sample_rate);

        self.hold_samples = (self.params.hold_ms * self.sample_rate as f32 / 1000.0) as usize;
    }

    /// Advance the detector by one frame and return the gain to apply
    fn next_gain(&mut self, input_level: f32) -> f32 {
        let coeff = if input_level > self.envelope {
            self.detector_attack
        } else {
            self.detector_release
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * input_level;

        self.state = match self.state {
            GateState::Closed if self.envelope > self.open_threshold => GateState::Open,
            GateState::Open if self.envelope < self.close_threshold => {
                self.hold_counter = self.hold_samples;
                GateState::Hold
            }
            GateState::Hold if self.envelope > self.open_threshold => GateState::Open,
            GateState::Hold if self.hold_counter == 0 => GateState::Closed,
            GateState::Hold => {
                self.hold_counter -= 1;
                GateState::Hold
            }
            other => other,
        };

        let target = match self.state {
            GateState::Closed => self.range_linear,
            GateState::Open | GateState::Hold => 1.0,
        };
        let coeff = if target > self.current_gain {
            self.gain_attack
        } else {
            self.gain_release
        };
        self.current_gain = coeff * self.current_gain + (1.0 - coeff) * target;
        self.current_gain
    }
}

impl Effect for Gate {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        if buffer.sample_rate != self.sample_rate {
            self.prepare(buffer.sample_rate);
        }
        let num_channels = buffer.num_channels();

        for frame in 0..buffer.num_samples() {
            let peak = (0..num_channels)
                .map(|ch| buffer.samples[ch][frame].abs())
                .fold(0.0_f32, f32::max);

            let gain = self.next_gain(peak);
            for ch in 0..num_channels {
                buffer.samples[ch][frame] *= gain;
            }
        }
    }

    fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.state = GateState::Closed;
        self.envelope = 0.0;
        self.current_gain = self.range_linear;
        self.hold_counter = 0;
    }

    fn get_params(&self) -> Value {
        serde_json::to_value(&self.params).unwrap_or(Value::Null)
    }

    impl_effect_common!("gate");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{calculate_rms, generate_test_tone};

    #[test]
    fn test_quiet_signal_is_gated() {
        let mut buffer = generate_test_tone(440.0, 0.5, INTERNAL_SAMPLE_RATE);
        buffer.apply_gain(-60.0);
        let mut gate = Gate::with_params(GateParams::default()).unwrap();

        gate.process(&mut buffer);
        assert!(calculate_rms(&buffer) < -100.0);
    }

    #[test]
    fn test_loud_signal_passes() {
        let mut buffer = generate_test_tone(440.0, 0.5, INTERNAL_SAMPLE_RATE);
        buffer.apply_gain(-6.0);
        let before = calculate_rms(&buffer);
        let mut gate = Gate::with_params(GateParams::default()).unwrap();

        gate.process(&mut buffer);
        assert!((calculate_rms(&buffer) - before).abs() < 0.5);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let params = GateParams {
            threshold_db: 6.0,
            ..Default::default()
        };
        assert!(Gate::with_params(params).is_err());
    }
}
