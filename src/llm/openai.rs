//! Client for hosted OpenAI-compatible chat-completions endpoints.
//!
//! The API key is held as a [`SecretString`] and only exposed when the
//! `Authorization` header is built. A missing key is reported on the first
//! call, not at construction.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionClient, CompletionRequest, LlmError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Chat-completions client. Does not derive `Debug` so the key cannot leak
/// through formatting.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<SecretString>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// Pull the provider's own message out of an error body, if it has one.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    }
}

fn first_completion(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingApiKey)?;

        debug!(model = %self.model, temperature = request.temperature, "sending chat completion");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key.expose_secret())
            .json(&self.build_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        first_completion(parsed)
    }
}
