//! Acoustic feature extraction for voice-model training

mod mel;

use tracing::debug;

use crate::engine::{import_audio, resample_channels, AudioBuffer};
use crate::error::{Result, StudioError};
use crate::training::AudioSource;

pub use mel::{MelConfig, MelFilterbank, MelSpectrogram};

/// Turns one training source into a spectrogram
pub trait FeatureExtractor {
    fn extract(&self, source: &AudioSource) -> Result<MelSpectrogram>;
}

/// Log mel spectrogram extractor
///
/// Paths are decoded with the WAV importer, mixed to mono and resampled to
/// the analysis rate before the STFT.
#[derive(Debug, Clone)]
pub struct MelExtractor {
    filterbank: MelFilterbank,
}

impl MelExtractor {
    pub fn new(config: MelConfig) -> Result<Self> {
        Ok(Self {
            filterbank: MelFilterbank::new(config)?,
        })
    }

    pub fn config(&self) -> &MelConfig {
        self.filterbank.config()
    }

    /// Mono samples at the analysis rate
    fn prepare_samples(&self, audio: &AudioBuffer) -> Vec<f32> {
        let mono = audio.to_mono();
        let target_rate = self.config().sample_rate;
        if audio.sample_rate == target_rate {
            return mono;
        }
        resample_channels(&[mono], audio.sample_rate, target_rate)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Spectrogram of an in-memory buffer
    pub fn extract_buffer(&self, audio: &AudioBuffer) -> Result<MelSpectrogram> {
        let samples = self.prepare_samples(audio);
        let min_samples = self.config().n_fft;
        if samples.len() < min_samples {
            let rate = self.config().sample_rate as f64;
            return Err(StudioError::AudioTooShort {
                duration_secs: samples.len() as f64 / rate,
                min_secs: min_samples as f64 / rate,
            });
        }
        Ok(self.filterbank.compute_log(&samples))
    }
}

impl FeatureExtractor for MelExtractor {
    fn extract(&self, source: &AudioSource) -> Result<MelSpectrogram> {
        let spectrogram = match source {
            AudioSource::Path(path) => self.extract_buffer(&import_audio(path)?)?,
            AudioSource::Buffer { audio, .. } => self.extract_buffer(audio)?,
        };
        debug!(
            "Extracted {} mel frames from {}",
            spectrogram.num_frames(),
            source.label()
        );
        Ok(spectrogram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{export_audio, generate_test_tone, ExportFormat, INTERNAL_SAMPLE_RATE};
    use tempfile::tempdir;

    fn extractor() -> MelExtractor {
        MelExtractor::new(MelConfig::default()).unwrap()
    }

    #[test]
    fn test_buffer_source_is_resampled() {
        let audio = generate_test_tone(440.0, 1.0, INTERNAL_SAMPLE_RATE);
        let spec = extractor()
            .extract(&AudioSource::buffer("tone", audio))
            .unwrap();

        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.n_mels, 80);
        assert!((spec.duration_secs() - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_path_source_matches_buffer_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let audio = generate_test_tone(440.0, 0.5, INTERNAL_SAMPLE_RATE);
        export_audio(&audio, &path, ExportFormat::new(INTERNAL_SAMPLE_RATE, 32)).unwrap();

        let from_path = extractor().extract(&AudioSource::from(path)).unwrap();
        let from_buffer = extractor()
            .extract(&AudioSource::buffer("tone", audio))
            .unwrap();
        assert_eq!(from_path.num_frames(), from_buffer.num_frames());
    }

    #[test]
    fn test_missing_file() {
        let err = extractor()
            .extract(&AudioSource::from("/nonexistent/voice.wav"))
            .unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_too_short() {
        let audio = generate_test_tone(440.0, 0.01, INTERNAL_SAMPLE_RATE);
        let err = extractor()
            .extract(&AudioSource::buffer("blip", audio))
            .unwrap_err();
        assert_eq!(err.error_code(), "AUDIO_TOO_SHORT");
    }
}
