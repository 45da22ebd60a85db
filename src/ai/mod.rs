pub mod extract;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::AiConfig;

/// Prefix of the text returned in place of a reply when the provider fails.
pub const ERROR_PREFIX: &str = "AI interface error: ";

#[derive(Debug, Error)]
pub enum AiError {
    /// Deployment mistake, surfaced on first use rather than masked as a reply.
    #[error("Model not configured. Set MODEL_API and MODEL_API_KEY")]
    NotConfigured,
}

/// Text completion seam used by the webhook dispatcher.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Send `prompt` (with an optional system prompt) and return the generated
    /// text. Provider failures come back as an `ERROR_PREFIX` string; only
    /// missing configuration is an `Err`.
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, AiError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn request(
        &self,
        endpoint: &str,
        api_key: &str,
        body: &ChatRequest<'_>,
    ) -> Result<Value, reqwest::Error> {
        let text = self
            .http
            .post(endpoint)
            .bearer_auth(api_key)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(response_bytes = text.len(), "received model response");

        // Non-JSON bodies are treated as a bare string reply.
        Ok(serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text)))
    }
}

#[async_trait]
impl Completion for AiClient {
    #[instrument(skip_all, fields(model = %self.config.model, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, AiError> {
        let endpoint = self.config.endpoint.as_deref().filter(|s| !s.is_empty());
        let api_key = self.config.api_key.as_deref().filter(|s| !s.is_empty());
        let (Some(endpoint), Some(api_key)) = (endpoint, api_key) else {
            return Err(AiError::NotConfigured);
        };

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
        };

        match self.request(endpoint, api_key, &body).await {
            Ok(data) => Ok(extract::extract_text(&data)),
            Err(e) => {
                warn!(error = %e, "model request failed");
                Ok(format!("{ERROR_PREFIX}{e}"))
            }
        }
    }
}
