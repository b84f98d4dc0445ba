//! AI-assisted code optimization
//!
//! `optimize_code` asks a completion endpoint to rewrite a snippet;
//! `analyze_ast` normalises Python source through its syntax tree.

mod ast;
mod client;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::error::{Result, StudioError};

pub use ast::analyze_ast;
pub use client::{
    Completion, CompletionChoice, CompletionClient, CompletionRequest, OpenAiCompletionClient,
};

/// Sampling temperature for optimization requests
pub const OPTIMIZE_TEMPERATURE: f32 = 0.3;

/// Upper bound on generated tokens
pub const OPTIMIZE_MAX_TOKENS: u32 = 2000;

/// Source language of a snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
    Python,
    Other(String),
}

impl FromStr for Language {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "python" {
            Ok(Self::Python)
        } else {
            Ok(Self::Other(s.to_string()))
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => f.write_str("python"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Prompt sent to the completion endpoint
pub fn build_prompt(code: &str, language: &str) -> String {
    format!(
        "Optimize this {language} code for better performance and readability.\n\
         Return only the optimized code without explanations.\n\
         \n\
         Original code:\n\
         {code}\n"
    )
}

/// Ask the completion endpoint for an optimized version of `code`
///
/// The suggestion is returned as generated (whitespace-trimmed); it is not
/// checked to be valid code.
pub fn optimize_code(client: &dyn CompletionClient, code: &str, language: &str) -> Result<String> {
    let request = CompletionRequest {
        model: client.model().to_string(),
        prompt: build_prompt(code, language),
        temperature: OPTIMIZE_TEMPERATURE,
        max_tokens: OPTIMIZE_MAX_TOKENS,
    };
    info!("Requesting {} optimization from {}", language, request.model);

    let completion = client.complete(&request)?;
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text.trim().to_string())
        .ok_or(StudioError::EmptyCompletion)
}
