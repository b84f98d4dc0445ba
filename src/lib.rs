//! Voice Studio - voice processing and AI code tooling
//!
//! Three independent tools share this library:
//! 1. `voice-engine` - load a recording, reduce noise, shift pitch, apply a
//!    voice style and save the result
//! 2. `train-voice` - turn recordings into mel spectrograms and train a
//!    voice model on them
//! 3. `optimize-code` - ask a completion endpoint for optimized code, or
//!    normalise Python source through its syntax tree
//!
//! # Architecture
//!
//! Each stage sits behind a trait (`Enhancer`, `StyleTransfer`,
//! `FeatureExtractor`, `VoiceModel`, `CompletionClient`) and is passed in by
//! the caller. The shipped implementations are built on the DSP effects in
//! [`dsp`] and the WAV engine in [`engine`].

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod enhance;
pub mod error;
pub mod features;
pub mod optimize;
pub mod style;
pub mod training;

pub use error::{Result, StudioError};
