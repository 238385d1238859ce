//! Agent runtime: the [`Harness`] loop, sub-agents, and the routing agent.
//!
//! - [`harness`]: the reason-act loop shared by every agent. Start here.
//! - [`engine`]: the [`ReasoningEngine`] seam and the OpenRouter-backed
//!   implementation.
//! - [`scripted`]: a deterministic engine for tests and demos.
//! - [`sub_agent`]: a specialist agent and the tool that delegates to it.
//! - [`routing`]: the entry point that refuses out-of-domain questions and
//!   joins sub-agent answers.
//! - [`events`]: [`EventHandler`] and [`AgentEvent`] for observing runs.
//! - [`usage`]: token and cost accounting shared across one query.
//! - [`prompt`]: [`SystemPromptBuilder`] for sectioned prompts.

pub mod config;
pub mod engine;
pub mod events;
pub mod harness;
pub mod prompt;
pub mod routing;
pub mod scripted;
pub mod sub_agent;
pub mod usage;

pub use config::{AgentConfig, DEFAULT_MAX_ROUNDS};
pub use engine::{
    EngineRequest, EngineTurn, NextAction, OpenRouterEngine, ReasoningEngine, ToolInvocation,
};
pub use events::{
    AgentEvent, AgentRun, EventHandler, EventObserver, LoggingHandler, NoopHandler, RunOutcome,
    ToolOutcome,
};
pub use harness::Harness;
pub use prompt::SystemPromptBuilder;
pub use routing::{Outcome, RoutedAnswer, RoutingAgent, ScopeGuard};
pub use scripted::{ScriptStep, ScriptedEngine};
pub use sub_agent::{SubAgent, SubAgentTool};
pub use usage::{UsageDelta, UsageSnapshot, UsageStats};
