//! [`ChatClient`] – OpenAI-compatible chat-completions client.
//!
//! Sends exactly one `POST {base_url}/chat/completions` per call and returns
//! `choices[0].message.content`.  There is no retry here; the scheduler's
//! next tick is the retry.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use aerollm_runtime::chat_client::{ChatClient, ChatMessage, CompletionRequest, EndpointConfig, Sampling};
//! use aerollm_runtime::deadline::Deadline;
//!
//! # async fn demo() -> Result<(), aerollm_types::PilotError> {
//! let client = ChatClient::new(EndpointConfig::new("http://localhost:11434/v1"));
//! let messages = vec![
//!     ChatMessage::system("You fly a small aircraft."),
//!     ChatMessage::user("{\"position\": {\"x\": 0, \"y\": 120, \"z\": 0}}"),
//! ];
//! let request = CompletionRequest {
//!     model: "llama3",
//!     messages: &messages,
//!     sampling: Sampling::default(),
//! };
//! let reply = client.send(&request, &Deadline::after(Duration::from_secs(5))).await?;
//! # Ok(())
//! # }
//! ```

use aerollm_types::PilotError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deadline::Deadline;

// ─────────────────────────────────────────────────────────────────────────────
// Message types (OpenAI-compatible)
// ─────────────────────────────────────────────────────────────────────────────

/// The role of a participant in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Where to send requests and how to authenticate.
#[derive(Clone)]
pub struct EndpointConfig {
    /// Base URL including any version prefix, e.g. `http://localhost:11434/v1`.
    pub base_url: String,
    /// Sent as `Authorization: Bearer <key>` when set.
    pub api_key: Option<String>,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Attach a bearer credential (builder-style).  Empty keys are ignored.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    /// `{base_url}/chat/completions`, tolerating a trailing slash.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                if self.api_key.is_some() { &"<redacted>" } else { &"<not set>" },
            )
            .finish()
    }
}

/// Sampling parameters passed through to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    /// Upper bound on reply length; must be positive.
    pub max_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 256,
        }
    }
}

/// One chat-completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub sampling: Sampling,
}

impl CompletionRequest<'_> {
    /// Reject requests that can never succeed before touching the network.
    ///
    /// # Errors
    ///
    /// [`PilotError::Configuration`] for an empty model, an empty
    /// conversation, or `max_tokens == 0`.
    pub fn validate(&self) -> Result<(), PilotError> {
        if self.model.trim().is_empty() {
            return Err(PilotError::Configuration("model identifier is empty".into()));
        }
        if self.messages.is_empty() {
            return Err(PilotError::Configuration("conversation is empty".into()));
        }
        if self.sampling.max_tokens == 0 {
            return Err(PilotError::Configuration("max_tokens must be positive".into()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport seam
// ─────────────────────────────────────────────────────────────────────────────

/// Anything that can turn a conversation into a reply text.
///
/// [`ChatClient`] is the production implementation; the scheduler only ever
/// talks to this trait.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and return the reply text.
    ///
    /// Implementations must give up with [`PilotError::Cancelled`] once
    /// `deadline` fires.
    async fn send(
        &self,
        request: &CompletionRequest<'_>,
        deadline: &Deadline,
    ) -> Result<String, PilotError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: &'a [ChatMessage],
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
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a response body.
///
/// # Errors
///
/// [`PilotError::MalformedResponse`] if the body is not JSON, has no
/// choices, or the first choice has no message content.
pub fn parse_completion(body: &str) -> Result<String, PilotError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| PilotError::MalformedResponse(e.to_string()))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PilotError::MalformedResponse("empty choices array".into()))?;
    choice
        .message
        .content
        .ok_or_else(|| PilotError::MalformedResponse("choice has no message content".into()))
}

// ─────────────────────────────────────────────────────────────────────────────
// ChatClient
// ─────────────────────────────────────────────────────────────────────────────

/// Async client for an OpenAI-compatible chat-completions endpoint.
///
/// Construct once and reuse across ticks; the underlying connection pool is
/// shared.
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: EndpointConfig,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self::with_http_client(endpoint, reqwest::Client::new())
    }

    /// Use a preconfigured [`reqwest::Client`] (proxy, TLS, pool settings).
    pub fn with_http_client(endpoint: EndpointConfig, http: reqwest::Client) -> Self {
        Self { endpoint, http }
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Send `request` and return the first choice's message content.
    ///
    /// # Errors
    ///
    /// - [`PilotError::Configuration`] if the request fails validation.
    /// - [`PilotError::Transport`] on a network failure or non-2xx status
    ///   (the status and body are carried for diagnostics).
    /// - [`PilotError::MalformedResponse`] if the body lacks the expected
    ///   fields.
    /// - [`PilotError::Cancelled`] if `deadline` fires first; the in-flight
    ///   request is dropped.
    pub async fn send(
        &self,
        request: &CompletionRequest<'_>,
        deadline: &Deadline,
    ) -> Result<String, PilotError> {
        request.validate()?;
        deadline.run(self.post(request)).await
    }

    async fn post(&self, request: &CompletionRequest<'_>) -> Result<String, PilotError> {
        let url = self.endpoint.completions_url();
        let body = ChatRequestBody {
            model: request.model,
            temperature: request.sampling.temperature,
            max_tokens: request.sampling.max_tokens,
            messages: request.messages,
        };

        let mut builder = self.http.post(&url).json(&body);
        if let Some(key) = &self.endpoint.api_key {
            builder = builder.bearer_auth(key);
        }

        debug!(%url, model = request.model, messages = request.messages.len(), "sending chat completion");
        let response = builder.send().await.map_err(network_error)?;
        let status = response.status();
        let text = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(PilotError::Transport {
                status: Some(status.as_u16()),
                body: text,
            });
        }
        parse_completion(&text)
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn send(
        &self,
        request: &CompletionRequest<'_>,
        deadline: &Deadline,
    ) -> Result<String, PilotError> {
        ChatClient::send(self, request, deadline).await
    }
}

fn network_error(e: reqwest::Error) -> PilotError {
    PilotError::Transport {
        status: e.status().map(|s| s.as_u16()),
        body: e.to_string(),
    }
}
