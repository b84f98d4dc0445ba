//! Runtime configuration
//!
//! Settings come from environment variables with sensible defaults.
//! Each config type also has an explicit constructor so tests and callers
//! never have to touch the process environment.

use std::env;
use std::time::Duration;

use secrecy::SecretString;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_API_BASE: &str = "VOICE_STUDIO_OPENAI_API_BASE";
pub const ENV_COMPLETION_MODEL: &str = "VOICE_STUDIO_COMPLETION_MODEL";
pub const ENV_COMPLETION_TIMEOUT_MS: &str = "VOICE_STUDIO_COMPLETION_TIMEOUT_MS";
pub const ENV_STYLE_BRIDGE_URL: &str = "VOICE_STUDIO_STYLE_BRIDGE_URL";
pub const ENV_STYLE_BRIDGE_TIMEOUT_MS: &str = "VOICE_STUDIO_STYLE_BRIDGE_TIMEOUT_MS";

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_BRIDGE_TIMEOUT_MS: u64 = 300_000; // 5 minutes

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Settings for the remote code-completion endpoint
#[derive(Debug)]
pub struct CompletionConfig {
    /// API key; `None` until provided or found in the environment
    pub api_key: Option<SecretString>,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

impl CompletionConfig {
    pub fn new(api_key: Option<String>, api_base: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.map(SecretString::from),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    pub fn from_env() -> Self {
        let api_base = env_non_empty(ENV_OPENAI_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.into());
        let model =
            env_non_empty(ENV_COMPLETION_MODEL).unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.into());
        let timeout_ms = env_u64(ENV_COMPLETION_TIMEOUT_MS).unwrap_or(DEFAULT_COMPLETION_TIMEOUT_MS);

        Self::new(
            env_non_empty(ENV_OPENAI_API_KEY),
            &api_base,
            &model,
            Duration::from_millis(timeout_ms),
        )
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self::new(
            None,
            DEFAULT_API_BASE,
            DEFAULT_COMPLETION_MODEL,
            Duration::from_millis(DEFAULT_COMPLETION_TIMEOUT_MS),
        )
    }
}

/// Settings for resolving a style model by name
#[derive(Debug, Clone)]
pub struct StyleConfig {
    /// Base URL of a remote style-transfer bridge; presets are used when unset
    pub bridge_url: Option<String>,
    pub bridge_timeout_ms: u64,
}

impl StyleConfig {
    pub fn presets_only() -> Self {
        Self {
            bridge_url: None,
            bridge_timeout_ms: DEFAULT_BRIDGE_TIMEOUT_MS,
        }
    }

    pub fn with_bridge(url: &str, timeout_ms: u64) -> Self {
        Self {
            bridge_url: Some(url.trim_end_matches('/').to_string()),
            bridge_timeout_ms: timeout_ms,
        }
    }

    pub fn from_env() -> Self {
        let timeout_ms = env_u64(ENV_STYLE_BRIDGE_TIMEOUT_MS).unwrap_or(DEFAULT_BRIDGE_TIMEOUT_MS);
        match env_non_empty(ENV_STYLE_BRIDGE_URL) {
            Some(url) => Self::with_bridge(&url, timeout_ms),
            None => Self {
                bridge_url: None,
                bridge_timeout_ms: timeout_ms,
            },
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::presets_only()
    }
}
