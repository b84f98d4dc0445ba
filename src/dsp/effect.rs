//! Effect trait definition
//!
//! Base trait for every DSP stage used by the enhancer and the preset styles.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::AudioBuffer;

/// Parameters common to all effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectParams {
    /// Unique identifier for this effect instance
    pub id: String,
    /// Whether the effect is enabled
    pub enabled: bool,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            enabled: true,
        }
    }
}

/// Base trait for all DSP effects
///
/// Effects process audio buffers in-place.
pub trait Effect: Send + Sync {
    /// Process audio buffer in-place
    fn process(&mut self, buffer: &mut AudioBuffer);

    /// Prepare the effect for processing at the given sample rate
    fn prepare(&mut self, sample_rate: u32);

    /// Clear internal state (filter history, envelopes, delay lines)
    fn reset(&mut self);

    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str;

    /// Get the unique instance ID
    fn id(&self) -> &str;

    /// Check if effect is enabled
    fn is_enabled(&self) -> bool;

    /// Enable or disable the effect
    fn set_enabled(&mut self, enabled: bool);

    /// Get all parameters as JSON (for logging)
    fn get_params(&self) -> Value;

    /// Clone the effect into a boxed trait object
    fn box_clone(&self) -> Box<dyn Effect>;
}

impl Clone for Box<dyn Effect> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Helper macro to implement common Effect trait methods
///
/// The implementing type needs a `common: EffectParams` field and `Clone`.
#[macro_export]
macro_rules! impl_effect_common {
    ($effect_type:expr) => {
        fn effect_type(&self) -> &'static str {
            $effect_type
        }

        fn id(&self) -> &str {
            &self.common.id
        }

        fn is_enabled(&self) -> bool {
            self.common.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.common.enabled = enabled;
        }

        fn box_clone(&self) -> Box<dyn Effect> {
            Box::new(self.clone())
        }
    };
}

/// Smoothing coefficient for a one-pole filter with the given time constant
#[inline]
pub(crate) fn time_coefficient(time_ms: f32, sample_rate: u32) -> f32 {
    if time_ms <= 0.0 || sample_rate == 0 {
        return 0.0;
    }
    (-1.0 / (time_ms * 0.001 * sample_rate as f32)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_params_get_unique_ids() {
        let a = EffectParams::default();
        let b = EffectParams::default();
        assert_ne!(a.id, b.id);
        assert!(a.enabled);
    }

    #[test]
    fn test_time_coefficient_range() {
        let coeff = time_coefficient(10.0, 48000);
        assert!(coeff > 0.0 && coeff < 1.0);
        assert_eq!(time_coefficient(0.0, 48000), 0.0);
        // Longer time constants smooth more
        assert!(time_coefficient(100.0, 48000) > coeff);
    }
}
