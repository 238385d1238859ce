//! Routing multi-agent runtime for read-only cluster inspection assistants.
//!
//! `kubeagent` answers a natural-language question by routing it to one or
//! more specialised sub-agents. Each sub-agent runs a reasoning loop (the
//! [`Harness`](agent::harness::Harness)) that asks a
//! [`ReasoningEngine`](agent::engine::ReasoningEngine) for the next action,
//! executes any requested tools, feeds their output back verbatim, and stops
//! when the engine produces a final answer or the iteration ceiling is hit.
//!
//! The engine is an external collaborator behind a narrow interface. The
//! production engine talks to the [OpenRouter](https://openrouter.ai/) chat
//! completions API; tests drive the same loop with a
//! [`ScriptedEngine`](agent::scripted::ScriptedEngine).
//!
//! # Getting started
//!
//! ```ignore
//! use kubeagent::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let client = Arc::new(OpenRouterClient::new(std::env::var("OPENROUTER_KEY").unwrap())?);
//!     let engine: Arc<dyn ReasoningEngine> = Arc::new(OpenRouterEngine::new(client, "openai/gpt-4o"));
//!
//!     let retrieval = SubAgentTool::new(
//!         ToolSpec::builder("retrieval_agent")
//!             .purpose("Fetch live state from the connected cluster")
//!             .when_to_use("The question is about objects that exist right now")
//!             .when_not_to_use("General how-to questions"),
//!         SubAgent::new(
//!             AgentConfig::new("retrieval", "You inspect the live cluster."),
//!             ToolSet::new().with(MyNamespaceTool::new()),
//!             engine.clone(),
//!         ),
//!     );
//!
//!     let router = RoutingAgent::new(
//!         AgentConfig::new("router", "Route OpenShift questions to the right agent."),
//!         engine,
//!     )
//!     .with_sub_agent(retrieval);
//!
//!     let answer = router
//!         .run("list all namespaces", CancellationToken::new())
//!         .await
//!         .map_err(|e| e.to_string())?;
//!     println!("{}\n\n{}", answer.answer, answer.usage);
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Run external commands:** [`CommandExecutor`](exec::CommandExecutor)
//!   resolves programs on `PATH` (or a pinned directory), enforces a timeout,
//!   and captures an [`ExecutionResult`](exec::ExecutionResult).
//! - **Define tools:** the [`Tool`](tools::core::Tool) trait,
//!   [`ToolSpec`](tools::spec::ToolSpec) for statically declared parameters,
//!   and [`ToolSet`](tools::core::ToolSet) for validated dispatch.
//! - **Run an agent:** [`SubAgent`](agent::sub_agent::SubAgent) for one
//!   specialised loop, [`RoutingAgent`](agent::routing::RoutingAgent) for the
//!   top-level dispatcher.
//! - **Observe a run:** implement [`EventHandler`](agent::events::EventHandler)
//!   or use [`LoggingHandler`](agent::events::LoggingHandler).
//! - **Account for cost:** [`UsageStats`](agent::usage::UsageStats) is shared
//!   across every nested call of one top-level query.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | Harness loop, sub-agents, routing, engines, events, usage |
//! | [`tools`] | `Tool` trait, `ToolSet`, `ToolSpec`, failure reflection |
//! | [`exec`] | Command executor with timeout, PATH policy, and truncation |
//! | [`api`] | OpenRouter client, retry with backoff, trace IDs, pricing |
//! | [`error`] | The [`AgentError`](error::AgentError) taxonomy |

pub mod agent;
pub mod api;
pub mod error;
pub mod exec;
pub mod prelude;
pub mod tools;

use serde::{Deserialize, Serialize};

pub use api::client::{OPENROUTER_URL, OpenRouterClient};
pub use error::AgentError;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o";

// ── Chat completions wire format ───────────────────────────────────

/// Request body for the chat completions endpoint. Zero and `None` fields
/// are left out so providers apply their own defaults.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDef>>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of an agent's history.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(MessageRole::User, content)
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, content)
    }

    /// An assistant turn requesting `calls`, with any text produced alongside.
    pub fn assistant_tool_calls(calls: Vec<ToolCall>, text: Option<String>) -> Self {
        Self {
            content: text,
            tool_calls: Some(calls),
            ..Self::text(MessageRole::Assistant, "")
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::text(MessageRole::Tool, content)
        }
    }
}

/// Always `"function"` on the wire.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallType {
    #[default]
    #[serde(rename = "function")]
    Function,
}

/// A tool offered to the engine, in function-calling format.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: CallType,
    pub function: FunctionDef,
}

impl ToolDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: CallType::Function,
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// A tool call recorded in an assistant turn.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default)]
    pub call_type: CallType,
    pub function: FunctionCallData,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FunctionCallData {
    pub name: String,
    /// Raw JSON, exactly as the engine produced it.
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content.as_deref(), Some("hello"));

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let tool = Message::tool_result("call-1", "result");
        assert_eq!(tool.role, MessageRole::Tool);
        assert_eq!(tool.content.as_deref(), Some("result"));
        assert_eq!(tool.tool_call_id.as_deref(), Some("call-1"));
    }

    #[test]
    fn assistant_tool_calls_keeps_text() {
        let call = ToolCall {
            id: "c1".into(),
            call_type: CallType::Function,
            function: FunctionCallData {
                name: "get_namespaces".into(),
                arguments: "{}".into(),
            },
        };
        let msg = Message::assistant_tool_calls(vec![call], Some("checking".into()));
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content.as_deref(), Some("checking"));
        assert_eq!(msg.tool_calls.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn chat_request_default_skips_none_fields() {
        let req = ChatRequest {
            model: Some("test-model".into()),
            messages: vec![Message::user("hi")],
            max_tokens: 100,
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("seed").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_tokens"], 100);

        let json = serde_json::to_value(ChatRequest {
            temperature: Some(0.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn tool_call_round_trips_wire_format() {
        let raw = r#"{"id":"call_1","type":"function","function":{"name":"get_pod_list","arguments":"{\"namespace\":\"default\"}"}}"#;
        let call: ToolCall = serde_json::from_str(raw).unwrap();
        assert_eq!(call.function.name, "get_pod_list");
        assert_eq!(call.call_type, CallType::Function);
    }
}
