use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;
use reqwest::Url;
use tracing::debug;

use super::{CompletionClient, CompletionRequest, LlmError};

pub const DEFAULT_HOST: &str = "http://localhost";
pub const DEFAULT_PORT: u16 = 11434;
pub const DEFAULT_MODEL: &str = "llama3.2:latest";

/// Completion backend for a local Ollama server.
pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    /// `url` carries scheme, host and port; see `config::ollama_url`.
    pub fn new(url: Url, model: impl Into<String>) -> Self {
        Self {
            client: Ollama::from_url(url),
            model: model.into(),
        }
    }

    fn options(request: &CompletionRequest) -> ModelOptions {
        ModelOptions::default()
            .temperature(request.temperature)
            .num_predict(i32::try_from(request.max_tokens).unwrap_or(i32::MAX))
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        debug!(model = %self.model, temperature = request.temperature, "sending ollama generation");

        let generation = GenerationRequest::new(self.model.clone(), request.prompt.clone())
            .options(Self::options(request));

        let response = self
            .client
            .generate(generation)
            .await
            .map_err(|e| LlmError::Ollama(e.to_string()))?;

        Ok(response.response.trim().to_string())
    }
}
