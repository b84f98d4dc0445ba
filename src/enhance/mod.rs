//! Voice enhancement
//!
//! The `Enhancer` trait is the load -> process -> save seam used by the
//! `voice-engine` pipeline. `VoiceEnhancer` is the built-in implementation:
//! WAV I/O, adaptive noise gating and pitch shifting.

mod noise;

use std::path::Path;

use tracing::{debug, info};

use crate::dsp::{EffectChain, PitchShifter};
use crate::engine::{export_audio, import_audio, AudioBuffer, ExportFormat};
use crate::error::Result;

pub use noise::{estimate_noise_floor_db, noise_reduction_gate, NOISE_FRAME_MS};

/// Options for a single enhancement pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceOptions {
    /// Gate out background noise below the estimated noise floor
    pub noise_reduction: bool,
    /// Pitch shift in semitones (0 = unchanged)
    pub pitch_shift: f32,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            noise_reduction: true,
            pitch_shift: 0.0,
        }
    }
}

/// Loads, cleans up and saves voice recordings
pub trait Enhancer {
    fn load_audio(&self, path: &Path) -> Result<AudioBuffer>;

    fn process(&self, audio: &AudioBuffer, options: &EnhanceOptions) -> Result<AudioBuffer>;

    fn save_audio(&self, audio: &AudioBuffer, path: &Path) -> Result<()>;
}

/// Built-in enhancer backed by the DSP effects
#[derive(Debug, Clone, Default)]
pub struct VoiceEnhancer {
    export_format: ExportFormat,
}

impl VoiceEnhancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export_format(export_format: ExportFormat) -> Self {
        Self { export_format }
    }
}

impl Enhancer for VoiceEnhancer {
    fn load_audio(&self, path: &Path) -> Result<AudioBuffer> {
        let audio = import_audio(path)?;
        debug!(
            "Loaded {} ({} channels, {:.2}s)",
            path.display(),
            audio.channels(),
            audio.duration_secs()
        );
        Ok(audio)
    }

    fn process(&self, audio: &AudioBuffer, options: &EnhanceOptions) -> Result<AudioBuffer> {
        let mut chain = EffectChain::new();

        if options.noise_reduction {
            let gate = noise_reduction_gate(audio)?;
            info!(
                "Noise reduction threshold: {:.1} dBFS",
                gate.params().threshold_db
            );
            chain.add(Box::new(gate));
        }

        let shifter = PitchShifter::new(options.pitch_shift)?;
        if !shifter.is_bypass() {
            info!("Pitch shift: {:+.2} semitones", shifter.semitones());
            chain.add(Box::new(shifter));
        }

        let mut output = audio.clone();
        chain.prepare(output.sample_rate);
        chain.process(&mut output)?;
        Ok(output)
    }

    fn save_audio(&self, audio: &AudioBuffer, path: &Path) -> Result<()> {
        let mut clipped = audio.clone();
        clipped.clamp();
        export_audio(&clipped, path, self.export_format)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}
