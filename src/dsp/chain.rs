//! Effect Chain
//!
//! Effects are processed in chain order (index 0 first). `add` places an
//! effect at its recommended slot:
//! 1. Gate (clean up noise before processing)
//! 2. Pitch shift
//! 3. EQ
//! 4. Compression

use tracing::{debug, warn};

use super::effect::Effect;
use crate::engine::AudioBuffer;
use crate::error::{Result, StudioError};

/// Default order priority for effect types (lower = earlier in chain)
pub fn default_order_priority(effect_type: &str) -> u32 {
    match effect_type {
        "gate" => 0,
        "pitch_shift" => 1,
        "parametric_eq" => 2,
        "compressor" => 3,
        _ => 2,
    }
}

/// Ordered chain of effects
#[derive(Clone, Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect at its recommended position
    ///
    /// Effects with equal priority keep insertion order.
    pub fn add(&mut self, effect: Box<dyn Effect>) {
        let priority = default_order_priority(effect.effect_type());
        let index = self
            .effects
            .iter()
            .position(|e| default_order_priority(e.effect_type()) > priority)
            .unwrap_or(self.effects.len());
        self.effects.insert(index, effect);
    }

    /// Builder form of [`EffectChain::add`]
    pub fn with(mut self, effect: Box<dyn Effect>) -> Self {
        self.add(effect);
        self
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect type identifiers in processing order
    pub fn effect_types(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.effect_type()).collect()
    }

    pub fn prepare(&mut self, sample_rate: u32) {
        for effect in &mut self.effects {
            effect.prepare(sample_rate);
        }
    }

    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Run every enabled effect over the buffer in order
    ///
    /// If an effect produces NaN/Inf the buffer is restored to its state
    /// before that effect and `DspOverflow` is returned.
    pub fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        for effect in self.effects.iter_mut().filter(|e| e.is_enabled()) {
            let snapshot = buffer.clone();
            effect.process(buffer);

            if !buffer.is_finite() {
                warn!("Effect '{}' produced non-finite samples", effect.effect_type());
                *buffer = snapshot;
                return Err(StudioError::DspOverflow {
                    effect_id: effect.id().to_string(),
                });
            }
            debug!(effect = effect.effect_type(), params = %effect.get_params(), "Applied effect");
        }
        Ok(())
    }
}
