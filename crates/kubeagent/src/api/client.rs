//! HTTP client for OpenAI-compatible chat completions endpoints.

use crate::{ChatRequest, ToolCall};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Why a chat completion call failed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat completions API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The provider answered 2xx with an error object.
    #[error("chat completions API error: {0}")]
    Provider(String),

    #[error("malformed chat completions response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Rate limits, server errors and transport failures are worth retrying.
    /// Client errors and malformed bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(e) => !e.is_builder(),
            ApiError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ApiError::Provider(_) | ApiError::Decode(_) => false,
        }
    }
}

/// Token counts reported with a completion.
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct UsageInfo {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// First choice of a completion, flattened.
#[derive(Debug, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    error: Option<WireError>,
    usage: Option<UsageInfo>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize)]
struct WireError {
    message: String,
}

impl WireResponse {
    fn into_completion(self) -> Result<ChatCompletion, ApiError> {
        if let Some(err) = self.error {
            return Err(ApiError::Provider(err.message));
        }
        let usage = self.usage;
        Ok(match self.choices.into_iter().next() {
            Some(choice) => ChatCompletion {
                content: choice.message.content,
                tool_calls: choice.message.tool_calls.unwrap_or_default(),
                usage,
                finish_reason: choice.finish_reason,
            },
            None => ChatCompletion {
                usage,
                ..ChatCompletion::default()
            },
        })
    }
}

/// Async client for the OpenRouter chat completions API.
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_headers(api_key, "https://github.com/tacryt-socryp/kubeagent", "kubeagent")
    }

    /// Client that identifies itself with the given `HTTP-Referer` and
    /// `X-Title` headers.
    pub fn with_headers(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kubeagent/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: OPENROUTER_URL.to_string(),
            referer: referer.into(),
            title: title.into(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, ApiError> {
        debug!(
            model = body.model.as_deref().unwrap_or("(none)"),
            messages = body.messages.len(),
            tools = body.tools.as_ref().map_or(0, Vec::len),
            "chat completion request"
        );
        let started = Instant::now();

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        trace!(
            "HTTP {status} after {:.1}s, {} bytes",
            started.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(ApiError::Status { status, body: text });
        }

        let completion = serde_json::from_str::<WireResponse>(&text)?.into_completion()?;
        if let Some(usage) = completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                tool_calls = completion.tool_calls.len(),
                "chat completion response"
            );
        }
        Ok(completion)
    }
}
