//! LLM client used to generate summaries.
//!
//! Uses rstructor to talk to Gemini. The rest of the crate only sees the
//! [`LlmClient`] trait, so the provider can be swapped in tests.

use crate::config::Config;
use async_trait::async_trait;
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),
    #[error("configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

/// A single-shot text generation client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt and return the raw response text
    async fn invoke(&self, prompt: &str) -> Result<String, AgentError>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// Models a provider name can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryModel {
    Flash20,
    Flash25,
    Pro25,
}

impl SummaryModel {
    /// Resolve a configured provider name to a model.
    ///
    /// Unknown names are not an error: they get the default model.
    pub fn from_provider(provider: &str) -> Self {
        match provider.trim().to_ascii_lowercase().as_str() {
            "gemini" | "gemini-2.0-flash" => SummaryModel::Flash20,
            "gemini-flash" | "gemini-2.5-flash" => SummaryModel::Flash25,
            "gemini-pro" | "gemini-2.5-pro" => SummaryModel::Pro25,
            _ => SummaryModel::Flash20, // Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryModel::Flash20 => "gemini-2.0-flash",
            SummaryModel::Flash25 => "gemini-2.5-flash",
            SummaryModel::Pro25 => "gemini-2.5-pro",
        }
    }

    fn to_gemini(self) -> GeminiModel {
        match self {
            SummaryModel::Flash20 => GeminiModel::Gemini20Flash,
            SummaryModel::Flash25 => GeminiModel::Gemini25Flash,
            SummaryModel::Pro25 => GeminiModel::Gemini25Pro,
        }
    }
}

/// Gemini-backed client. The underlying HTTP client is built once and
/// shared by every call.
#[derive(Clone)]
pub struct GeminiAgent {
    client: GeminiClient,
    model: SummaryModel,
}

impl fmt::Debug for GeminiAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // No key in logs
        f.debug_struct("GeminiAgent")
            .field("model", &self.model.as_str())
            .finish_non_exhaustive()
    }
}

impl GeminiAgent {
    pub fn new(api_key: &str, model: SummaryModel) -> Result<Self, AgentError> {
        let client = GeminiClient::new(api_key)
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?
            .model(model.to_gemini());

        Ok(Self { client, model })
    }

    /// Build the client from the configured provider and API key
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        let api_key = config.api_key()?;
        let model = SummaryModel::from_provider(&config.agent.provider);
        Self::new(api_key, model)
    }

    pub fn model(&self) -> SummaryModel {
        self.model
    }
}

#[async_trait]
impl LlmClient for GeminiAgent {
    async fn invoke(&self, prompt: &str) -> Result<String, AgentError> {
        let result = self
            .client
            .generate_with_metadata(prompt)
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        Ok(result.text)
    }

    fn model_name(&self) -> &str {
        self.model.as_str()
    }
}
