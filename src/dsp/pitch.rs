//! Pitch shifter
//!
//! Duration-preserving pitch shift using two modulated delay-line taps,
//! half a window apart and crossfaded with complementary sin^2 windows.
//! Cheap and artifact-tolerant, which is fine for speech.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::effect::{Effect, EffectParams};
use crate::engine::{AudioBuffer, INTERNAL_SAMPLE_RATE};
use crate::error::{Result, StudioError};
use crate::impl_effect_common;

/// Largest shift accepted in either direction
pub const MAX_SEMITONES: f32 = 24.0;

/// Pitch shifter parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchParams {
    /// Shift in semitones (-24 to +24); 0 is a bypass
    pub semitones: f32,
    /// Length of the sweeping delay window in ms
    pub window_ms: f32,
}

impl Default for PitchParams {
    fn default() -> Self {
        Self {
            semitones: 0.0,
            window_ms: 40.0,
        }
    }
}

#[derive(Debug, Clone)]
struct ChannelState {
    delay_line: Vec<f32>,
    write_pos: usize,
    /// Position within the sweep, in [0, 1)
    phase: f64,
}

impl ChannelState {
    fn new(len: usize) -> Self {
        Self {
            delay_line: vec![0.0; len],
            write_pos: 0,
            phase: 0.0,
        }
    }

    /// Read `delay` samples behind the write head with linear interpolation
    fn read(&self, delay: f64) -> f32 {
        let len = self.delay_line.len();
        let pos = (self.write_pos as f64 - delay).rem_euclid(len as f64);
        let idx = pos.floor() as usize % len;
        let next = (idx + 1) % len;
        let frac = (pos - pos.floor()) as f32;
        self.delay_line[idx] * (1.0 - frac) + self.delay_line[next] * frac
    }
}

/// Pitch shift effect
#[derive(Debug, Clone)]
pub struct PitchShifter {
    common: EffectParams,
    params: PitchParams,
    sample_rate: u32,
    window_samples: usize,
    states: Vec<ChannelState>,
}

impl PitchShifter {
    pub fn new(semitones: f32) -> Result<Self> {
        Self::with_params(PitchParams {
            semitones,
            ..Default::default()
        })
    }

    pub fn with_params(params: PitchParams) -> Result<Self> {
        if !params.semitones.is_finite() || params.semitones.abs() > MAX_SEMITONES {
            return Err(StudioError::InvalidParameter {
                param: "pitch".to_string(),
                value: params.semitones.to_string(),
                expected: format!("-{0} to +{0} semitones", MAX_SEMITONES),
            });
        }
        if !(10.0..=100.0).contains(&params.window_ms) {
            return Err(StudioError::InvalidParameter {
                param: "window_ms".to_string(),
                value: params.window_ms.to_string(),
                expected: "10 to 100 ms".to_string(),
            });
        }

        let mut shifter = Self {
            common: EffectParams::default(),
            params,
            sample_rate: INTERNAL_SAMPLE_RATE,
            window_samples: 0,
            states: Vec::new(),
        };
        shifter.prepare(INTERNAL_SAMPLE_RATE);
        Ok(shifter)
    }

    pub fn semitones(&self) -> f32 {
        self.params.semitones
    }

    /// Frequency ratio for the configured shift
    pub fn ratio(&self) -> f64 {
        2.0_f64.powf(self.params.semitones as f64 / 12.0)
    }

    pub fn is_bypass(&self) -> bool {
        self.params.semitones == 0.0
    }
}

impl Effect for PitchShifter {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        if self.is_bypass() {
            return;
        }
        if buffer.sample_rate != self.sample_rate {
            self.prepare(buffer.sample_rate);
        }

        let window = self.window_samples as f64;
        // The delay sweeps at (1 - ratio) samples per sample
        let phase_step = (1.0 - self.ratio()) / window;
        let line_len = self.window_samples + 2;
        if self.states.len() != buffer.num_channels() {
            self.states = vec![ChannelState::new(line_len); buffer.num_channels()];
        }

        for (ch, state) in self.states.iter_mut().enumerate() {
            for sample in buffer.channel_mut(ch).iter_mut() {
                state.delay_line[state.write_pos] = *sample;

                let mut out = 0.0;
                for tap in 0..2 {
                    let p = (state.phase + tap as f64 * 0.5).fract();
                    let gain = (std::f64::consts::PI * p).sin().powi(2) as f32;
                    out += gain * state.read(p * window);
                }
                *sample = out;

                state.phase = (state.phase + phase_step).rem_euclid(1.0);
                state.write_pos = (state.write_pos + 1) % line_len;
            }
        }
    }

    fn prepare(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.window_samples =
            ((self.params.window_ms / 1000.0) * sample_rate as f32).max(2.0) as usize;
        self.reset();
    }

    fn reset(&mut self) {
        self.states.clear();
    }

    fn get_params(&self) -> Value {
        serde_json::to_value(&self.params).unwrap_or(Value::Null)
    }

    impl_effect_common!("pitch_shift");
}
