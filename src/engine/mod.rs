//! Audio Engine Module
//!
//! Core audio plumbing:
//! - Audio buffer management
//! - WAV file I/O and resampling

pub mod buffer;
pub mod io;

pub use buffer::{
    calculate_peak, calculate_rms, db_to_linear, linear_to_db, AudioBuffer, ChannelLayout,
    INTERNAL_SAMPLE_RATE,
};
pub use io::{export_audio, generate_test_tone, import_audio, resample_channels, ExportFormat};
