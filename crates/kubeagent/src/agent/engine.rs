//! The reasoning-engine seam.
//!
//! An agent never talks to a model directly. Each round it hands the
//! conversation so far to a [`ReasoningEngine`] and gets back one decision:
//! call some tools, or stop with a final answer. [`OpenRouterEngine`] backs
//! this with the chat completions API; tests use
//! [`ScriptedEngine`](super::scripted::ScriptedEngine).

use crate::agent::usage::UsageDelta;
use crate::api::client::OpenRouterClient;
use crate::api::retry::{RetryConfig, retry_api_call};
use crate::api::tracing::{ModelPricing, pricing_for_model};
use crate::error::AgentError;
use crate::{CallType, ChatRequest, FunctionCallData, Message, ToolCall, ToolDef};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Boxed future returned by [`ReasoningEngine::propose_next_action`].
pub type EngineFuture<'a> =
    Pin<Box<dyn Future<Output = Result<EngineTurn, AgentError>> + Send + 'a>>;

/// What the engine sees each round.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    /// Name of the agent asking.
    pub agent: &'a str,
    /// System prompt, user query, then every assistant turn and tool result.
    pub history: &'a [Message],
    /// Tools the agent may call.
    pub tools: &'a [ToolDef],
}

/// One tool call proposed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: String,
    /// Overrides the agent's tool timeout for this call.
    pub timeout: Option<Duration>,
}

impl ToolInvocation {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The history entry recording this call.
    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall {
            id: self.id.clone(),
            call_type: CallType::Function,
            function: FunctionCallData {
                name: self.name.clone(),
                arguments: self.arguments.clone(),
            },
        }
    }
}

impl From<ToolCall> for ToolInvocation {
    fn from(call: ToolCall) -> Self {
        Self::new(call.id, call.function.name, call.function.arguments)
    }
}

/// The engine's decision for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    CallTools(Vec<ToolInvocation>),
    FinalAnswer(String),
}

/// One engine round trip.
#[derive(Debug, Clone)]
pub struct EngineTurn {
    pub action: NextAction,
    /// Text the engine produced alongside tool calls, if any.
    pub text: Option<String>,
    pub usage: UsageDelta,
}

/// Decides an agent's next step from its history.
pub trait ReasoningEngine: Send + Sync {
    fn propose_next_action<'a>(&'a self, request: EngineRequest<'a>) -> EngineFuture<'a>;

    /// Identifier for logs.
    fn name(&self) -> &str;
}

// ── OpenRouter ─────────────────────────────────────────────────────

/// [`ReasoningEngine`] backed by an OpenAI-compatible chat completions API.
///
/// ```ignore
/// let client = Arc::new(OpenRouterClient::new(api_key)?);
/// let engine = OpenRouterEngine::new(client, "openai/gpt-4o").with_max_tokens(2048);
/// ```
pub struct OpenRouterEngine {
    client: Arc<OpenRouterClient>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry: RetryConfig,
    pricing: ModelPricing,
}

impl OpenRouterEngine {
    pub fn new(client: Arc<OpenRouterClient>, model: impl Into<String>) -> Self {
        let model = model.into();
        let pricing = pricing_for_model(&model);
        Self {
            client,
            model,
            max_tokens: 4096,
            temperature: 0.0,
            retry: RetryConfig::default(),
            pricing,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ReasoningEngine for OpenRouterEngine {
    fn propose_next_action<'a>(&'a self, request: EngineRequest<'a>) -> EngineFuture<'a> {
        Box::pin(async move {
            let body = ChatRequest {
                model: Some(self.model.clone()),
                messages: request.history.to_vec(),
                max_tokens: self.max_tokens,
                temperature: Some(self.temperature),
                seed: None,
                tools: (!request.tools.is_empty()).then(|| request.tools.to_vec()),
            };

            let completion = retry_api_call(&self.retry, || self.client.chat(&body))
                .await
                .map_err(|e| AgentError::Engine(e.to_string()))?;

            let usage = completion
                .usage
                .as_ref()
                .map(|u| {
                    let prompt = u64::from(u.prompt_tokens);
                    let completion = u64::from(u.completion_tokens);
                    UsageDelta::request(prompt, completion)
                        .with_cost(self.pricing.estimate_cost(prompt, completion))
                })
                .unwrap_or_else(|| UsageDelta::request(0, 0));

            debug!(
                "[{}] engine turn: {} tool call(s), finish_reason={:?}",
                request.agent,
                completion.tool_calls.len(),
                completion.finish_reason
            );

            let turn = if completion.tool_calls.is_empty() {
                EngineTurn {
                    action: NextAction::FinalAnswer(completion.content.unwrap_or_default()),
                    text: None,
                    usage,
                }
            } else {
                EngineTurn {
                    action: NextAction::CallTools(
                        completion
                            .tool_calls
                            .into_iter()
                            .map(ToolInvocation::from)
                            .collect(),
                    ),
                    text: completion.content.filter(|c| !c.is_empty()),
                    usage,
                }
            };
            Ok(turn)
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_round_trips_through_tool_call() {
        let inv = ToolInvocation::new("call_1", "get_namespaces", "{}");
        let call = inv.to_tool_call();
        assert_eq!(call.function.name, "get_namespaces");
        assert_eq!(ToolInvocation::from(call), inv);
    }

    #[test]
    fn engine_defaults() {
        let client = Arc::new(OpenRouterClient::new("test-key").unwrap());
        let engine = OpenRouterEngine::new(client, "openai/gpt-4o").with_max_tokens(1024);
        assert_eq!(engine.name(), "openai/gpt-4o");
        assert_eq!(engine.max_tokens, 1024);
        assert_eq!(engine.pricing, pricing_for_model("openai/gpt-4o"));
    }
}
