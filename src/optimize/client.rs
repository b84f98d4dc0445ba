//! Text-completion endpoint client
//!
//! Speaks the OpenAI-compatible `/completions` API with a blocking HTTP
//! client.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CompletionConfig, ENV_OPENAI_API_KEY};
use crate::error::{Result, StudioError};

/// Body of a completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionChoice {
    pub text: String,
}

/// Response of a completion request; only the generated texts are kept
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

/// Remote text-completion service
pub trait CompletionClient {
    /// Model name sent with every request
    fn model(&self) -> &str;

    fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Client for OpenAI-compatible completion endpoints
pub struct OpenAiCompletionClient {
    /// Never printed; see the `Debug` impl
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl fmt::Debug for OpenAiCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompletionClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiCompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|key| SecretString::from(key.expose_secret().to_owned()))
            .ok_or_else(|| StudioError::MissingApiKey {
                env_var: ENV_OPENAI_API_KEY.to_string(),
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StudioError::CompletionRequest {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            client,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl CompletionClient for OpenAiCompletionClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let url = format!("{}/completions", self.api_base);
        debug!("Sending completion request to {} (model: {})", url, request.model);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(request)
            .send()
            .map_err(|e| StudioError::CompletionRequest {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StudioError::CompletionApi {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Completion>()
            .map_err(|e| StudioError::CompletionRequest {
                reason: format!("Failed to parse completion response: {}", e),
            })
    }
}
