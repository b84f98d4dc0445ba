//! voice-engine
//!
//! Loads a recording, cleans it up, applies a voice style and writes the
//! result. Exits with status 1 on any failure.

use std::io;
use std::process;

use clap::Parser;

use voice_studio::cli::commands::run_voice_engine;
use voice_studio::cli::{init_logging, VoiceEngineArgs};
use voice_studio::config::StyleConfig;
use voice_studio::enhance::VoiceEnhancer;
use voice_studio::style::create_style;

fn run(args: &VoiceEngineArgs) -> anyhow::Result<()> {
    let config = StyleConfig::from_env();
    let enhancer = VoiceEnhancer::new();
    run_voice_engine(
        args,
        &enhancer,
        |name| create_style(name, &config),
        &mut io::stdout().lock(),
    )?;
    Ok(())
}

fn main() {
    let args = VoiceEngineArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error during processing: {:#}", e);
        process::exit(1);
    }
}
