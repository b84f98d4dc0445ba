//! train-voice
//!
//! Trains the mel profile voice model from WAV files and directories.

use std::io;
use std::process;

use anyhow::Context;
use clap::Parser;

use voice_studio::cli::commands::run_train;
use voice_studio::cli::{init_logging, TrainArgs};

fn main() {
    let args = TrainArgs::parse();
    init_logging(args.verbose);

    let result = run_train(&args, &mut io::stdout().lock())
        .with_context(|| format!("Training failed for {} input path(s)", args.paths.len()));

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
