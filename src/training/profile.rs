//! Mel profile voice model
//!
//! Learns per-band statistics of a speaker's log mel spectrum. Small enough
//! to train on a laptop; the checkpoint is a plain JSON document.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use super::VoiceModel;
use crate::error::{Result, StudioError};
use crate::features::MelSpectrogram;

/// Checkpoint format written by this version
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

/// Serialized model state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCheckpoint {
    pub format_version: u32,
    #[serde(default)]
    pub run_id: Option<Uuid>,
    pub trained_at: DateTime<Utc>,
    pub epochs: usize,
    pub n_mels: usize,
    pub frames_seen: u64,
    /// SHA-256 over the training frames, to tell datasets apart
    #[serde(default)]
    pub dataset_sha256: Option<String>,
    pub mean: Vec<f32>,
    pub variance: Vec<f32>,
}

/// Running mean/variance per mel band (Welford)
#[derive(Debug, Clone)]
struct BandStats {
    count: u64,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl BandStats {
    fn new(n_mels: usize) -> Self {
        Self {
            count: 0,
            mean: vec![0.0; n_mels],
            m2: vec![0.0; n_mels],
        }
    }

    fn push(&mut self, frame: &[f32]) {
        self.count += 1;
        let n = self.count as f64;
        for (band, &value) in frame.iter().enumerate() {
            let x = value as f64;
            let delta = x - self.mean[band];
            self.mean[band] += delta / n;
            self.m2[band] += delta * (x - self.mean[band]);
        }
    }

    fn variance(&self) -> Vec<f32> {
        self.m2
            .iter()
            .map(|m2| if self.count > 0 { (m2 / self.count as f64) as f32 } else { 0.0 })
            .collect()
    }
}

fn dataset_digest(spectrograms: &[MelSpectrogram]) -> String {
    let mut hasher = Sha256::new();
    for spectrogram in spectrograms {
        hasher.update((spectrogram.frames.len() as u64).to_le_bytes());
        for value in spectrogram.frames.iter().flatten() {
            hasher.update(value.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Per-band log mel mean and variance of a voice
#[derive(Debug, Clone, Default)]
pub struct MelProfileModel {
    checkpoint: Option<ProfileCheckpoint>,
}

impl MelProfileModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.checkpoint.is_some()
    }

    /// Learned state, once trained or loaded
    pub fn checkpoint(&self) -> Option<&ProfileCheckpoint> {
        self.checkpoint.as_ref()
    }

    /// Read a checkpoint written by [`VoiceModel::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StudioError::Checkpoint {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let checkpoint: ProfileCheckpoint = serde_json::from_str(&content)?;

        if checkpoint.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(StudioError::Checkpoint {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported format version {} (expected {})",
                    checkpoint.format_version, CHECKPOINT_FORMAT_VERSION
                ),
            });
        }
        let n_mels = checkpoint.n_mels;
        if checkpoint.mean.len() != n_mels || checkpoint.variance.len() != n_mels {
            return Err(StudioError::Checkpoint {
                path: path.to_path_buf(),
                reason: format!("statistics do not match n_mels = {}", checkpoint.n_mels),
            });
        }

        Ok(Self {
            checkpoint: Some(checkpoint),
        })
    }
}

impl VoiceModel for MelProfileModel {
    fn train(&mut self, spectrograms: &[MelSpectrogram], epochs: usize) -> Result<()> {
        if epochs == 0 {
            return Err(StudioError::InvalidParameter {
                param: "epochs".to_string(),
                value: "0".to_string(),
                expected: "at least 1".to_string(),
            });
        }
        let n_mels = match spectrograms.iter().find(|s| !s.is_empty()) {
            Some(first) => first.n_mels,
            None => return Err(StudioError::EmptyTrainingSet),
        };
        for spectrogram in spectrograms {
            if let Some(frame) = spectrogram.frames.iter().find(|f| f.len() != n_mels) {
                return Err(StudioError::ShapeMismatch {
                    expected: n_mels,
                    actual: frame.len(),
                });
            }
        }

        // Closed-form statistics: further epochs would reproduce the same values
        let mut stats = BandStats::new(n_mels);
        for frame in spectrograms.iter().flat_map(|s| s.frames.iter()) {
            stats.push(frame);
        }
        debug!("Profiled {} frames ({} epochs requested)", stats.count, epochs);

        self.checkpoint = Some(ProfileCheckpoint {
            format_version: CHECKPOINT_FORMAT_VERSION,
            run_id: Some(Uuid::new_v4()),
            trained_at: Utc::now(),
            epochs,
            n_mels,
            frames_seen: stats.count,
            dataset_sha256: Some(dataset_digest(spectrograms)),
            mean: stats.mean.iter().map(|&m| m as f32).collect(),
            variance: stats.variance(),
        });
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let checkpoint = self.checkpoint.as_ref().ok_or_else(|| StudioError::Checkpoint {
            path: path.to_path_buf(),
            reason: "model has not been trained".to_string(),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StudioError::Checkpoint {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let content = serde_json::to_string_pretty(checkpoint)?;
        fs::write(path, content).map_err(|e| StudioError::Checkpoint {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
