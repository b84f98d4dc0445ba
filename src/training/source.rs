//! Training inputs: audio files on disk or in-memory buffers

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::engine::AudioBuffer;
use crate::error::{Result, StudioError};

/// One item of a training set
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// Audio file to decode
    Path(PathBuf),
    /// Already decoded audio with a label for logs and reports
    Buffer { label: String, audio: AudioBuffer },
}

impl AudioSource {
    pub fn buffer(label: &str, audio: AudioBuffer) -> Self {
        Self::Buffer {
            label: label.to_string(),
            audio,
        }
    }

    /// Human-readable name: the path, or the buffer's label
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Buffer { label, .. } => label.clone(),
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for AudioSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for AudioSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Expand a mix of files and directories into training sources
///
/// Directories are searched recursively for `.wav` files (any case), sorted
/// by path. File arguments are kept as given, even without a `.wav`
/// extension, so that a bad explicit file shows up as a skipped item.
pub fn discover_audio_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<AudioSource>> {
    let mut sources = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && is_wav(entry.path()))
                .map(|entry| entry.path().to_path_buf())
                .collect();
            if found.is_empty() {
                return Err(StudioError::FileNotFound {
                    path: path.join("*.wav"),
                });
            }
            found.sort();
            sources.extend(found.into_iter().map(AudioSource::Path));
        } else {
            sources.push(AudioSource::Path(path.to_path_buf()));
        }
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_directory_is_expanded_and_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        for name in ["b.wav", "a.WAV", "notes.txt", "sub/c.wav"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let sources = discover_audio_files(&[dir.path()]).unwrap();
        let labels: Vec<String> = sources
            .iter()
            .map(|s| match s {
                AudioSource::Path(p) => p.strip_prefix(dir.path()).unwrap().display().to_string(),
                AudioSource::Buffer { .. } => unreachable!(),
            })
            .collect();

        assert_eq!(labels, vec!["a.WAV", "b.wav", "sub/c.wav"]);
    }

    #[test]
    fn test_explicit_files_kept_in_order() {
        let sources = discover_audio_files(&["z.wav", "take1.flac"]).unwrap();
        assert_eq!(
            sources,
            vec![AudioSource::from("z.wav"), AudioSource::from("take1.flac")]
        );
    }

    #[test]
    fn test_directory_without_audio() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), b"").unwrap();
        let err = discover_audio_files(&[dir.path()]).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_labels() {
        let buffer = AudioSource::buffer("take-3", AudioBuffer::default());
        assert_eq!(buffer.to_string(), "take-3");
        assert_eq!(AudioSource::from("voice/a.wav").label(), "voice/a.wav");
    }
}
