use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Highest retry count accepted from configuration.
pub const RETRY_LIMIT: u32 = 5;

/// Base delay for exponential backoff between attempts.
const BASE_BACKOFF_MS: u64 = 1000;
/// Upper bound on any single backoff wait.
const MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("an API key is required for the chat-completion endpoint")]
    MissingCredential,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("endpoint returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("response envelope has no message content")]
    MissingContent { body: String },
}

impl ChatError {
    /// Response text received before the failure, if any.
    pub fn raw_body(&self) -> &str {
        match self {
            ChatError::Status { body, .. } | ChatError::MissingContent { body } => body,
            ChatError::InvalidBaseUrl(_)
            | ChatError::MissingCredential
            | ChatError::Transport(_) => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// A text-generation backend that answers a chat request with one reply.
pub trait ChatCompletion {
    fn complete(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    pub api_base: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// Parses and checks an API base URL, returning it without a trailing slash.
pub fn parse_api_base(api_base: &str) -> Result<String, ChatError> {
    let url = Url::parse(api_base).map_err(|e| ChatError::InvalidBaseUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ChatError::InvalidBaseUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Blocking client for OpenAI-compatible chat-completion endpoints.
pub struct HttpChatClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    max_retries: u32,
    base_backoff_ms: u64,
}

impl HttpChatClient {
    /// Refuses a blank API key so no request goes out unauthenticated.
    pub fn new(config: ChatClientConfig) -> Result<Self, ChatError> {
        if config.api_key.trim().is_empty() {
            return Err(ChatError::MissingCredential);
        }
        let endpoint = format!("{}/chat/completions", parse_api_base(&config.api_base)?);
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            max_retries: config.max_retries,
            base_backoff_ms: BASE_BACKOFF_MS,
        })
    }

    pub fn with_base_backoff(mut self, base: Duration) -> Self {
        self.base_backoff_ms = u64::try_from(base.as_millis()).unwrap_or(MAX_BACKOFF_MS);
        self
    }

    fn send_once(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        extract_reply_content(&body)
    }
}

impl ChatCompletion for HttpChatClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                thread::sleep(backoff_delay(self.base_backoff_ms, attempt));
            }

            match self.send_once(request) {
                Ok(content) => {
                    info!(
                        action = "complete",
                        component = "chat_client",
                        attempts = attempt + 1,
                        reply_chars = content.len(),
                        duration_ms = start_time.elapsed().as_millis(),
                        "Chat completion received"
                    );
                    return Ok(content);
                }
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    warn!(
                        action = "retry",
                        component = "chat_client",
                        attempt = attempt + 1,
                        max_attempts = self.max_retries + 1,
                        error = %e,
                        "Transient chat completion failure"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exponential backoff (base, 2x base, 4x base, ...) capped at
/// `MAX_BACKOFF_MS`.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

fn is_retryable(error: &ChatError) -> bool {
    match error {
        ChatError::Transport(_) => true,
        ChatError::Status { status, .. } => matches!(*status, 429 | 500 | 502 | 503 | 504),
        ChatError::InvalidBaseUrl(_)
        | ChatError::MissingCredential
        | ChatError::MissingContent { .. } => false,
    }
}

/// Pulls `choices[0].message.content` out of a chat-completion envelope.
pub fn extract_reply_content(body: &str) -> Result<String, ChatError> {
    let envelope: serde_json::Value =
        serde_json::from_str(body).map_err(|_| ChatError::MissingContent {
            body: body.to_string(),
        })?;

    envelope["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ChatError::MissingContent {
            body: body.to_string(),
        })
}
