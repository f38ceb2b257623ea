//! Completion backends.
//!
//! Both prompts of a turn go through [`CompletionClient::complete`] as a
//! single user message. The backend owns the model name; callers only pick
//! the sampling temperature and the output bound.

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use self::ollama::OllamaClient;
pub use self::openai::OpenAiClient;

/// One prompt to complete.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Errors from a completion backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("response contained no completion")]
    EmptyResponse,

    #[error("ollama error: {0}")]
    Ollama(String),
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Complete `request.prompt`, returning the response text with
    /// surrounding whitespace trimmed.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
