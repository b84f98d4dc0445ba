//! Voice-model training
//!
//! `VoiceTrainer` runs the preprocess -> train -> export sequence over a
//! `VoiceModel` and a `FeatureExtractor` supplied by the caller. Sources that
//! fail feature extraction are skipped and reported, never fatal.

mod profile;
mod source;

use std::path::{Path, PathBuf};

use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::features::{FeatureExtractor, MelConfig, MelExtractor, MelSpectrogram};

pub use profile::{MelProfileModel, ProfileCheckpoint, CHECKPOINT_FORMAT_VERSION};
pub use source::{discover_audio_files, AudioSource};

/// Where `train_from_audio` writes the model
pub const DEFAULT_CHECKPOINT_PATH: &str = "trained_model.pth";

/// Training epochs when the caller does not choose
pub const DEFAULT_EPOCHS: usize = 100;

/// A trainable, saveable voice model
pub trait VoiceModel {
    fn train(&mut self, spectrograms: &[MelSpectrogram], epochs: usize) -> Result<()>;

    fn save(&self, path: &Path) -> Result<()>;
}

/// Result of preprocessing one source
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Processed {
        source: String,
        spectrogram: MelSpectrogram,
    },
    Skipped {
        source: String,
        reason: String,
    },
}

impl FileOutcome {
    pub fn source(&self) -> &str {
        match self {
            Self::Processed { source, .. } | Self::Skipped { source, .. } => source,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }
}

/// Per-source outcomes of a preprocessing pass, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessReport {
    pub outcomes: Vec<FileOutcome>,
}

impl PreprocessReport {
    /// Successful spectrograms in input order
    pub fn spectrograms(&self) -> Vec<MelSpectrogram> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Processed { spectrogram, .. } => Some(spectrogram.clone()),
                FileOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    /// `(source, reason)` for every skipped source
    pub fn skipped(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Skipped { source, reason } => Some((source.as_str(), reason.as_str())),
                FileOutcome::Processed { .. } => None,
            })
            .collect()
    }

    pub fn processed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.processed_count()
    }
}

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub checkpoint: PathBuf,
    pub report: PreprocessReport,
    pub epochs: usize,
    pub run_id: Uuid,
}

/// Orchestrates preprocessing, training and export
#[derive(Debug)]
pub struct VoiceTrainer<M: VoiceModel, E: FeatureExtractor> {
    model: M,
    extractor: E,
}

impl VoiceTrainer<MelProfileModel, MelExtractor> {
    /// Mel profile model with the default mel configuration
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(
            MelProfileModel::new(),
            MelExtractor::new(MelConfig::default())?,
        ))
    }
}

impl<M: VoiceModel, E: FeatureExtractor> VoiceTrainer<M, E> {
    pub fn new(model: M, extractor: E) -> Self {
        Self { model, extractor }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Extract features from every source, recording failures
    pub fn preprocess(&self, sources: &[AudioSource]) -> PreprocessReport {
        let outcomes = sources
            .iter()
            .map(|source| match self.extractor.extract(source) {
                Ok(spectrogram) => FileOutcome::Processed {
                    source: source.label(),
                    spectrogram,
                },
                Err(e) => {
                    warn!("Failed to process file {}: {}", source, e);
                    FileOutcome::Skipped {
                        source: source.label(),
                        reason: e.to_string(),
                    }
                }
            })
            .collect();

        PreprocessReport { outcomes }
    }

    /// Train on `sources` and write the model to [`DEFAULT_CHECKPOINT_PATH`]
    pub fn train_from_audio(
        &mut self,
        sources: &[AudioSource],
        epochs: usize,
    ) -> Result<TrainingOutcome> {
        self.train_from_audio_to(sources, epochs, Path::new(DEFAULT_CHECKPOINT_PATH))
    }

    /// Train on `sources` and write the model to `path`
    pub fn train_from_audio_to(
        &mut self,
        sources: &[AudioSource],
        epochs: usize,
        path: &Path,
    ) -> Result<TrainingOutcome> {
        let run_id = Uuid::new_v4();
        let _span = info_span!("training", %run_id).entered();

        let report = self.preprocess(sources);
        info!(
            "Preprocessed {} sources ({} skipped)",
            report.outcomes.len(),
            report.skipped_count()
        );

        let checkpoint = self
            .model
            .train(&report.spectrograms(), epochs)
            .and_then(|()| self.export_model(path))
            .map_err(|e| {
                error!("Training failed: {}", e);
                e
            })?;

        Ok(TrainingOutcome {
            checkpoint,
            report,
            epochs,
            run_id,
        })
    }

    /// Save the model and return `path` as given
    pub fn export_model(&self, path: &Path) -> Result<PathBuf> {
        self.model.save(path)?;
        info!("Model saved to {}", path.display());
        Ok(path.to_path_buf())
    }
}
