//! CLI Command Implementations
//!
//! User-facing progress goes to the supplied writer (stdout in the
//! binaries); diagnostics go through `tracing`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::info;

use super::{TrainArgs, VoiceEngineArgs};
use crate::enhance::{EnhanceOptions, Enhancer};
use crate::error::Result;
use crate::optimize::{analyze_ast, optimize_code, CompletionClient};
use crate::style::StyleTransfer;
use crate::training::{discover_audio_files, TrainingOutcome, VoiceTrainer};

/// Load -> enhance -> style -> save
///
/// `resolve_style` turns the `--model` name into a style once the loading
/// line has been printed. Any failing stage aborts the run; nothing is
/// written in that case.
pub fn run_voice_engine<F>(
    args: &VoiceEngineArgs,
    enhancer: &dyn Enhancer,
    resolve_style: F,
    out: &mut dyn Write,
) -> Result<()>
where
    F: FnOnce(&str) -> Result<Box<dyn StyleTransfer>>,
{
    writeln!(out, "Loading input audio from {}...", args.input.display())?;
    let style = resolve_style(&args.model)?;
    let audio = enhancer.load_audio(&args.input)?;

    writeln!(out, "Applying noise reduction and pitch shift...")?;
    let options = EnhanceOptions {
        noise_reduction: true,
        pitch_shift: args.pitch,
    };
    let enhanced = enhancer.process(&audio, &options)?;

    writeln!(out, "Applying style transfer model '{}'...", args.model)?;
    let styled = style.apply(&enhanced)?;

    writeln!(out, "Saving processed audio to {}...", args.output.display())?;
    enhancer.save_audio(&styled, &args.output)?;

    writeln!(out, "Processing completed successfully.")?;
    Ok(())
}

/// Train the default voice model on the given files and directories
pub fn run_train(args: &TrainArgs, out: &mut dyn Write) -> Result<TrainingOutcome> {
    let sources = discover_audio_files(&args.paths)?;
    info!("Found {} training sources", sources.len());

    let mut trainer = VoiceTrainer::with_defaults()?;
    let outcome = trainer.train_from_audio_to(&sources, args.epochs, &args.output)?;

    for (source, reason) in outcome.report.skipped() {
        writeln!(out, "Skipped {}: {}", source, reason)?;
    }
    writeln!(
        out,
        "Trained on {} of {} files for {} epochs; model written to {}",
        outcome.report.processed_count(),
        outcome.report.outcomes.len(),
        outcome.epochs,
        outcome.checkpoint.display()
    )?;
    Ok(outcome)
}

/// Read source code from a file, or stdin when no file is given
pub fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut code = String::new();
            io::stdin().read_to_string(&mut code)?;
            Ok(code)
        }
    }
}

/// Print the completion endpoint's optimized version of `code`
pub fn run_optimize(
    code: &str,
    language: &str,
    client: &dyn CompletionClient,
    out: &mut dyn Write,
) -> Result<()> {
    let suggestion = optimize_code(client, code, language)?;
    writeln!(out, "{}", suggestion)?;
    Ok(())
}

/// Print the syntax-tree round-trip of `code`
pub fn run_analyze(code: &str, language: &str, out: &mut dyn Write) -> Result<()> {
    out.write_all(analyze_ast(code, language)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{generate_test_tone, AudioBuffer, INTERNAL_SAMPLE_RATE};
    use crate::config::StyleConfig;
    use crate::error::StudioError;
    use crate::style::create_style;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct FakeEnhancer {
        calls: RefCell<Vec<String>>,
        fail_load: bool,
    }

    impl Enhancer for FakeEnhancer {
        fn load_audio(&self, path: &Path) -> Result<AudioBuffer> {
            self.calls.borrow_mut().push("load".into());
            if self.fail_load {
                return Err(StudioError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Ok(generate_test_tone(220.0, 0.1, INTERNAL_SAMPLE_RATE))
        }

        fn process(&self, audio: &AudioBuffer, options: &EnhanceOptions) -> Result<AudioBuffer> {
            self.calls.borrow_mut().push(format!(
                "process nr={} pitch={}",
                options.noise_reduction, options.pitch_shift
            ));
            Ok(audio.clone())
        }

        fn save_audio(&self, _audio: &AudioBuffer, path: &Path) -> Result<()> {
            self.calls.borrow_mut().push(format!("save {}", path.display()));
            Ok(())
        }
    }

    struct FakeStyle {
        fail: bool,
    }

    fn fake_style(fail: bool) -> impl FnOnce(&str) -> Result<Box<dyn StyleTransfer>> {
        move |_| Ok(Box::new(FakeStyle { fail }) as Box<dyn StyleTransfer>)
    }

    impl StyleTransfer for FakeStyle {
        fn name(&self) -> &str {
            "fake"
        }

        fn apply(&self, audio: &AudioBuffer) -> Result<AudioBuffer> {
            if self.fail {
                return Err(StudioError::StyleTransferFailed {
                    reason: "model exploded".into(),
                });
            }
            Ok(audio.clone())
        }
    }

    fn args(pitch: f32) -> VoiceEngineArgs {
        VoiceEngineArgs {
            input: PathBuf::from("in.wav"),
            output: PathBuf::from("out.wav"),
            model: "broadcast".into(),
            pitch,
            verbose: false,
        }
    }

    #[test]
    fn test_pipeline_output() {
        let enhancer = FakeEnhancer::default();
        let mut out = Vec::new();

        run_voice_engine(&args(-2.0), &enhancer, fake_style(false), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Loading input audio from in.wav...\n\
             Applying noise reduction and pitch shift...\n\
             Applying style transfer model 'broadcast'...\n\
             Saving processed audio to out.wav...\n\
             Processing completed successfully.\n"
        );
        assert_eq!(
            *enhancer.calls.borrow(),
            vec!["load", "process nr=true pitch=-2", "save out.wav"]
        );
    }

    #[test]
    fn test_style_failure_stops_before_save() {
        let enhancer = FakeEnhancer::default();
        let mut out = Vec::new();

        let err = run_voice_engine(&args(0.0), &enhancer, fake_style(true), &mut out)
            .unwrap_err();

        assert_eq!(err.error_code(), "STYLE_TRANSFER_FAILED");
        assert_eq!(*enhancer.calls.borrow(), vec!["load", "process nr=true pitch=0"]);
        assert!(!String::from_utf8(out).unwrap().contains("completed"));
    }

    #[test]
    fn test_load_failure() {
        let enhancer = FakeEnhancer {
            fail_load: true,
            ..Default::default()
        };
        let mut out = Vec::new();

        let err = run_voice_engine(&args(0.0), &enhancer, fake_style(false), &mut out)
            .unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
        assert_eq!(*enhancer.calls.borrow(), vec!["load"]);
    }

    #[test]
    fn test_unknown_style_fails_after_loading_line() {
        let enhancer = FakeEnhancer::default();
        let mut bad_args = args(0.0);
        bad_args.model = "cartoon-chipmunk".into();
        let mut out = Vec::new();

        let err = run_voice_engine(
            &bad_args,
            &enhancer,
            |name| create_style(name, &StyleConfig::presets_only()),
            &mut out,
        )
        .unwrap_err();

        assert_eq!(err.error_code(), "UNKNOWN_STYLE");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Loading input audio from in.wav...\n"
        );
        assert!(enhancer.calls.borrow().is_empty());
    }

    #[test]
    fn test_analyze_writes_round_trip() {
        let mut out = Vec::new();
        run_analyze("x = 1   # one\n", "python", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x = 1\n");
    }
}
