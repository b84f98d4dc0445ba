//! optimize-code
//!
//! Prints an AI-suggested optimization of a code snippet, or with
//! `--ast-only` its Python syntax-tree round-trip.

use std::io;
use std::process;

use anyhow::Context;
use clap::Parser;

use voice_studio::cli::commands::{read_source, run_analyze, run_optimize};
use voice_studio::cli::{init_logging, OptimizeArgs};
use voice_studio::config::CompletionConfig;
use voice_studio::optimize::OpenAiCompletionClient;

fn run(args: &OptimizeArgs) -> anyhow::Result<()> {
    let code = read_source(args.file.as_deref()).context("Failed to read source code")?;
    let mut out = io::stdout().lock();

    if args.ast_only {
        run_analyze(&code, &args.language, &mut out)?;
        return Ok(());
    }

    let client = OpenAiCompletionClient::new(&CompletionConfig::from_env())?;
    run_optimize(&code, &args.language, &client, &mut out)
        .with_context(|| format!("Optimization request to {} failed", client.api_base()))?;
    Ok(())
}

fn main() {
    let args = OptimizeArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
