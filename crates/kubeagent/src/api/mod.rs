//! Talking to the chat completions API.
//!
//! - [`client`]: the OpenRouter HTTP client and its typed [`ApiError`].
//! - [`retry`]: exponential backoff for rate limits, 5xx and transport errors.
//! - [`tracing`]: trace IDs for correlating a query across agents, and
//!   per-model pricing for the usage summary.

pub mod client;
pub mod retry;
pub mod tracing;

pub use client::{ApiError, ChatCompletion, OPENROUTER_URL, OpenRouterClient, UsageInfo};
pub use retry::{RetryConfig, retry_api_call};
pub use tracing::{ModelPricing, generate_trace_id, pricing_for_model};
