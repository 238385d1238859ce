//! Convenience re-exports for building an assistant.
//!
//! ```ignore
//! use kubeagent::prelude::*;
//! ```
//!
//! Covers the client, message types, agents, tools, and the executor.
//! Retry tuning and pricing tables stay in [`api`](crate::api).

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{AgentError, Message, OpenRouterClient, ToolDef};

// ── Agent runtime ───────────────────────────────────────────────────
pub use crate::agent::{
    AgentConfig, AgentEvent, AgentRun, EventHandler, EventObserver, Harness, LoggingHandler,
    NoopHandler, OpenRouterEngine, Outcome, ReasoningEngine, RoutedAnswer, RoutingAgent,
    ScopeGuard, ScriptStep, ScriptedEngine, SubAgent, SubAgentTool, SystemPromptBuilder,
    UsageSnapshot, UsageStats,
};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::spec::{ParamType, ToolSpec};
pub use crate::tools::{Tool, ToolContext, ToolFuture, ToolOutput, ToolSet, parse_tool_args};

// ── Commands ────────────────────────────────────────────────────────
pub use crate::exec::{CommandExecutor, CommandSpec, ExecutionResult, ExecutorConfig};

pub use tokio_util::sync::CancellationToken;
