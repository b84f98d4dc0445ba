//! DSP Effects Library
//!
//! Signal processing building blocks for voice enhancement and the preset
//! styles. All effects implement the `Effect` trait for uniform processing.

mod chain;
mod compressor;
mod effect;
mod eq;
mod gate;
mod pitch;

pub use chain::{default_order_priority, EffectChain};
pub use compressor::{Compressor, CompressorParams};
pub use effect::{Effect, EffectParams};
pub use eq::{EQBand, FilterType, ParametricEQ, MAX_BANDS};
pub use gate::{Gate, GateParams};
pub use pitch::{PitchParams, PitchShifter, MAX_SEMITONES};
