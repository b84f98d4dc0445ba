//! Error handling for Voice Studio
//!
//! Every fallible operation in the crate returns [`Result`]. Errors carry
//! enough context to print a useful one-line message from the binaries.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Voice Studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Main error type for Voice Studio operations
#[derive(Error, Debug)]
pub enum StudioError {
    // File Errors
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Audio too short: {duration_secs:.3}s (minimum {min_secs}s)")]
    AudioTooShort { duration_secs: f64, min_secs: f64 },

    // Processing Errors
    #[error("Invalid parameter '{param}' = {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("DSP overflow: '{effect_id}' produced invalid audio (NaN/Inf)")]
    DspOverflow { effect_id: String },

    // Style Transfer Errors
    #[error("Unknown style model '{style}' (available: {available})")]
    UnknownStyle { style: String, available: String },

    #[error("Style transfer failed: {reason}")]
    StyleTransferFailed { reason: String },

    #[error("Style bridge unavailable: {reason}")]
    BridgeUnavailable { reason: String },

    #[error("Style bridge timed out after {timeout_ms}ms")]
    BridgeTimeout { timeout_ms: u64 },

    // Training Errors
    #[error("No spectrograms to train on")]
    EmptyTrainingSet,

    #[error("Spectrogram shape mismatch: expected {expected} mel bins, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Checkpoint error at {}: {reason}", path.display())]
    Checkpoint { path: PathBuf, reason: String },

    // Code Optimization Errors
    #[error("API key not found: set {env_var}")]
    MissingApiKey { env_var: String },

    #[error("Completion request failed: {reason}")]
    CompletionRequest { reason: String },

    #[error("Completion API error ({status}): {body}")]
    CompletionApi { status: u16, body: String },

    #[error("Completion response contained no choices")]
    EmptyCompletion,

    #[error("Failed to parse {language} source: {message}")]
    Parse { language: String, message: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StudioError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StudioError::FileNotFound { .. } => "FILE_NOT_FOUND",
            StudioError::InvalidAudio { .. } => "INVALID_AUDIO",
            StudioError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            StudioError::EmptyAudio => "EMPTY_AUDIO",
            StudioError::AudioTooShort { .. } => "AUDIO_TOO_SHORT",
            StudioError::InvalidParameter { .. } => "INVALID_PARAMETER",
            StudioError::DspOverflow { .. } => "DSP_OVERFLOW",
            StudioError::UnknownStyle { .. } => "UNKNOWN_STYLE",
            StudioError::StyleTransferFailed { .. } => "STYLE_TRANSFER_FAILED",
            StudioError::BridgeUnavailable { .. } => "BRIDGE_UNAVAILABLE",
            StudioError::BridgeTimeout { .. } => "BRIDGE_TIMEOUT",
            StudioError::EmptyTrainingSet => "EMPTY_TRAINING_SET",
            StudioError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            StudioError::Checkpoint { .. } => "CHECKPOINT_ERROR",
            StudioError::MissingApiKey { .. } => "MISSING_API_KEY",
            StudioError::CompletionRequest { .. } => "COMPLETION_REQUEST_FAILED",
            StudioError::CompletionApi { .. } => "COMPLETION_API_ERROR",
            StudioError::EmptyCompletion => "EMPTY_COMPLETION",
            StudioError::Parse { .. } => "PARSE_ERROR",
            StudioError::Io(_) => "IO_ERROR",
            StudioError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the failure is local to one input item.
    ///
    /// Recoverable errors are the ones a batch operation (such as training
    /// preprocessing) can record and move past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StudioError::FileNotFound { .. }
                | StudioError::InvalidAudio { .. }
                | StudioError::UnsupportedFormat { .. }
                | StudioError::EmptyAudio
                | StudioError::AudioTooShort { .. }
                | StudioError::BridgeTimeout { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StudioError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            StudioError::InvalidAudio { .. } | StudioError::UnsupportedFormat { .. } => vec![
                "Convert the file to mono or stereo WAV first",
                "Supported sample formats: 8/16/24/32-bit PCM, 32-bit float",
            ],
            StudioError::UnknownStyle { .. } => vec![
                "Pass one of the listed style names to --model",
                "Set VOICE_STUDIO_STYLE_BRIDGE_URL to use a remote style model",
            ],
            StudioError::BridgeUnavailable { .. } | StudioError::BridgeTimeout { .. } => vec![
                "Check that the style bridge server is running",
                "Unset VOICE_STUDIO_STYLE_BRIDGE_URL to use the built-in presets",
            ],
            StudioError::MissingApiKey { .. } => vec!["Export OPENAI_API_KEY before running"],
            StudioError::EmptyTrainingSet => vec![
                "None of the input files could be processed",
                "Check the skipped-file messages for the individual causes",
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = StudioError::FileNotFound {
            path: PathBuf::from("test.wav"),
        };
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
        assert_eq!(err.to_string(), "File not found: test.wav");
    }

    #[test]
    fn test_per_item_errors_are_recoverable() {
        assert!(StudioError::EmptyAudio.is_recoverable());
        assert!(!StudioError::EmptyTrainingSet.is_recoverable());
        assert!(!StudioError::EmptyCompletion.is_recoverable());
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = StudioError::UnknownStyle {
            style: "robot".to_string(),
            available: "professional-male".to_string(),
        };
        assert!(!err.recovery_suggestions().is_empty());
        assert!(err.to_string().contains("robot"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StudioError = io.into();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
