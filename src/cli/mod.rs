//! CLI Module
//!
//! Argument definitions for the `voice-engine`, `train-voice` and
//! `optimize-code` binaries.

pub mod commands;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::style::DEFAULT_STYLE;
use crate::training::{DEFAULT_CHECKPOINT_PATH, DEFAULT_EPOCHS};

/// Process and stylize audio with voice models
#[derive(Parser, Debug)]
#[command(name = "voice-engine", version, about, long_about = None)]
pub struct VoiceEngineArgs {
    /// Input audio file path
    #[arg(long)]
    pub input: PathBuf,

    /// Output audio file path (written as WAV)
    #[arg(long)]
    pub output: PathBuf,

    /// Voice style model to apply
    #[arg(long, default_value = DEFAULT_STYLE)]
    pub model: String,

    /// Pitch shift amount in semitones
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pitch: f32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Train a voice model from recordings
#[derive(Parser, Debug)]
#[command(name = "train-voice", version, about, long_about = None)]
pub struct TrainArgs {
    /// WAV files or directories containing them
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Number of training epochs
    #[arg(long, default_value_t = DEFAULT_EPOCHS)]
    pub epochs: usize,

    /// Where to write the trained model
    #[arg(short, long, default_value = DEFAULT_CHECKPOINT_PATH)]
    pub output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Suggest optimized code using an AI completion endpoint
#[derive(Parser, Debug)]
#[command(name = "optimize-code", version, about, long_about = None)]
pub struct OptimizeArgs {
    /// Source language of the code
    #[arg(short, long)]
    pub language: String,

    /// Read code from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Only run the syntax-tree round-trip (no network)
    #[arg(long)]
    pub ast_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
