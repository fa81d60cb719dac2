//! Chat completion client for the drafting model

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::prompts::DRAFT_SYSTEM;
use super::retry::{RetryConfig, with_retry};
use crate::config::AiConfig;
use crate::constants::QUOTA_EXCEEDED_MESSAGE;
use crate::error::{CompletionError, ConfigError};

/// Successful outcome of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Generated text, with the closing signature already split onto two lines
    Text(String),
    /// The endpoint answered HTTP 429
    QuotaExceeded,
}

impl Completion {
    /// Generated text, or the human-readable quota message.
    pub fn into_text(self) -> String {
        match self {
            Completion::Text(text) => text,
            Completion::QuotaExceeded => QUOTA_EXCEEDED_MESSAGE.to_string(),
        }
    }
}

/// Anything that can turn a prompt into a [`Completion`].
pub trait CompletionBackend: Send + Sync {
    fn send(&self, prompt: &str)
    -> impl Future<Output = Result<Completion, CompletionError>> + Send;
}

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
    retry: RetryConfig,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl CompletionClient {
    /// Create a client. Fails if `api_key` is empty or blank.
    pub fn new(api_key: impl Into<String>, config: &AiConfig) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            retry: RetryConfig::new(
                config.max_retries,
                Duration::from_millis(500),
                Duration::from_secs(10),
            ),
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, pooling).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Send `prompt` and return the generated text.
    ///
    /// A rate-limited request (HTTP 429) is not an error: the quota message is
    /// returned as the text instead.
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.request(prompt).await.map(Completion::into_text)
    }

    /// Send `prompt`, retrying transient 5xx failures up to the configured bound.
    pub async fn request(&self, prompt: &str) -> Result<Completion, CompletionError> {
        with_retry(&self.retry, CompletionError::is_transient, || {
            self.send_once(prompt)
        })
        .await
    }

    async fn send_once(&self, prompt: &str) -> Result<Completion, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: DRAFT_SYSTEM,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let outcome = tokio::time::timeout(self.timeout, self.exchange(&request))
            .await
            .map_err(|_| CompletionError::Timeout)?;

        if let Ok(Completion::Text(text)) = &outcome {
            tracing::info!("Completion received ({} chars)", text.len());
        }
        outcome
    }

    async fn exchange(&self, request: &ChatRequest<'_>) -> Result<Completion, CompletionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Completion endpoint reported quota exceeded");
            return Ok(Completion::QuotaExceeded);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::InvalidResponse(e.to_string())
            }
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                CompletionError::InvalidResponse("No response content from model".to_string())
            })?;

        Ok(Completion::Text(normalize_closing(&content)))
    }
}

impl CompletionBackend for CompletionClient {
    fn send(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Completion, CompletionError>> + Send {
        self.request(prompt)
    }
}

fn transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Transport(e)
    }
}

/// Split `Best regards, Name` onto two lines for the two spellings models produce.
pub fn normalize_closing(text: &str) -> String {
    text.replace("Best regards, ", "Best regards,\n")
        .replace("Best regards , ", "Best regards,\n")
}
