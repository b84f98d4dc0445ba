//! Noise floor estimation for adaptive noise reduction

use crate::dsp::{Gate, GateParams};
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Analysis frame length for the noise floor estimate
pub const NOISE_FRAME_MS: f32 = 20.0;

/// Percentile of frame levels taken as the noise floor
const NOISE_PERCENTILE: f32 = 0.10;

/// Gate opens this far above the noise floor
const THRESHOLD_MARGIN_DB: f32 = 6.0;

/// Level reported for frames of digital silence
const DIGITAL_SILENCE_DB: f32 = -120.0;

/// Estimate the background noise level of a recording in dBFS
///
/// Takes a low percentile of short-frame RMS levels, on the assumption that
/// speech leaves at least some pauses in the recording.
pub fn estimate_noise_floor_db(audio: &AudioBuffer) -> f32 {
    let frame_len = ((NOISE_FRAME_MS / 1000.0) * audio.sample_rate as f32) as usize;
    let mut levels: Vec<f32> = audio
        .frame_rms_db(frame_len.max(1))
        .into_iter()
        .map(|db| if db.is_finite() { db } else { DIGITAL_SILENCE_DB })
        .collect();

    if levels.is_empty() {
        return DIGITAL_SILENCE_DB;
    }

    levels.sort_by(|a, b| a.total_cmp(b));
    let index = ((levels.len() - 1) as f32 * NOISE_PERCENTILE).floor() as usize;
    levels[index]
}

/// Build a noise gate tuned to the recording's noise floor
///
/// The threshold sits a few dB above the floor, clamped to [-80, -20] dBFS
/// so that neither near-silent nor very noisy recordings produce extreme
/// settings.
pub fn noise_reduction_gate(audio: &AudioBuffer) -> Result<Gate> {
    let floor = estimate_noise_floor_db(audio);
    Gate::with_params(GateParams {
        threshold_db: (floor + THRESHOLD_MARGIN_DB).clamp(-80.0, -20.0),
        attack_ms: 2.0,
        release_ms: 20.0,
        hold_ms: 10.0,
        range_db: -30.0,
        hysteresis_db: 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{generate_test_tone, INTERNAL_SAMPLE_RATE};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_floor_of_steady_tone_is_its_rms() {
        let mut tone = generate_test_tone(1000.0, 0.5, INTERNAL_SAMPLE_RATE);
        tone.apply_gain(-20.0);
        assert_abs_diff_eq!(estimate_noise_floor_db(&tone), -23.01, epsilon = 0.2);
    }

    #[test]
    fn test_digital_silence_floor() {
        let silent = AudioBuffer::new(4800, crate::engine::ChannelLayout::Mono);
        assert_eq!(estimate_noise_floor_db(&silent), DIGITAL_SILENCE_DB);

        let gate = noise_reduction_gate(&silent).unwrap();
        assert_eq!(gate.params().threshold_db, -80.0);
    }

    #[test]
    fn test_threshold_is_clamped_for_loud_recordings() {
        let loud = generate_test_tone(200.0, 0.5, INTERNAL_SAMPLE_RATE);
        let gate = noise_reduction_gate(&loud).unwrap();
        assert_eq!(gate.params().threshold_db, -20.0);
    }
}
