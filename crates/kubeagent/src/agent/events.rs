//! Events, handlers, and run results for the [`Harness`](super::harness::Harness).
//!
//! Every agent (the router and each sub-agent) reports its progress through
//! [`AgentEvent`] variants. Each variant carries the name of the agent that
//! emitted it, so one handler can observe a whole routed query.
//!
//! # Choosing an event handler
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`EventObserver`] | Quick closures for simple callbacks |

use crate::Message;
use crate::agent::usage::{UsageDelta, UsageSnapshot};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted while an agent runs.
#[derive(Debug)]
pub enum AgentEvent<'a> {
    /// A new reasoning round is starting.
    RoundStart {
        agent: &'a str,
        round: u32,
        max_rounds: u32,
    },
    /// The engine returned text (may be alongside tool calls).
    Text { agent: &'a str, text: &'a str },
    ToolCallsReceived {
        agent: &'a str,
        round: u32,
        count: usize,
    },
    /// A single tool is about to be executed.
    ToolExecuting {
        agent: &'a str,
        name: &'a str,
        arguments: &'a str,
    },
    /// A single tool finished. `result` is exactly what the engine will see.
    ToolResult {
        agent: &'a str,
        name: &'a str,
        call_id: &'a str,
        result: &'a str,
        ok: bool,
    },
    TokenUsage { agent: &'a str, usage: UsageDelta },
    /// The engine returned nothing usable; the harness retries.
    EmptyResponse {
        agent: &'a str,
        round: u32,
        attempt: u32,
        max_retries: u32,
    },
    /// The agent produced its final answer.
    Finished { agent: &'a str, rounds_used: u32 },
    /// The agent hit the round limit without finishing.
    RoundLimitReached { agent: &'a str, max_rounds: u32 },
    /// The router handed the query to a sub-agent tool.
    DelegationStarted {
        agent: &'a str,
        target: &'a str,
        query: &'a str,
    },
    DelegationFinished {
        agent: &'a str,
        target: &'a str,
        ok: bool,
    },
    /// The router refused an out-of-domain query without delegating.
    QueryRefused { agent: &'a str, query: &'a str },
}

impl AgentEvent<'_> {
    /// Name of the agent that emitted this event.
    pub fn agent(&self) -> &str {
        match self {
            AgentEvent::RoundStart { agent, .. }
            | AgentEvent::Text { agent, .. }
            | AgentEvent::ToolCallsReceived { agent, .. }
            | AgentEvent::ToolExecuting { agent, .. }
            | AgentEvent::ToolResult { agent, .. }
            | AgentEvent::TokenUsage { agent, .. }
            | AgentEvent::EmptyResponse { agent, .. }
            | AgentEvent::Finished { agent, .. }
            | AgentEvent::RoundLimitReached { agent, .. }
            | AgentEvent::DelegationStarted { agent, .. }
            | AgentEvent::DelegationFinished { agent, .. }
            | AgentEvent::QueryRefused { agent, .. } => agent,
        }
    }
}

/// Handler for agent events.
///
/// Implement this trait to react to agent loop events: logging, metrics,
/// or test assertions. The default implementation ignores everything.
///
/// # Example
///
/// ```ignore
/// struct PrintTools;
///
/// impl EventHandler for PrintTools {
///     fn on_event(&self, event: &AgentEvent<'_>) {
///         if let AgentEvent::ToolExecuting { agent, name, .. } = event {
///             println!("{agent} -> {name}");
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &AgentEvent<'_>) {
        let _ = event;
    }
}

impl<T: EventHandler + ?Sized> EventHandler for Arc<T> {
    fn on_event(&self, event: &AgentEvent<'_>) {
        (**self).on_event(event);
    }
}

/// A no-op event handler.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// Adapts an observation closure into an [`EventHandler`].
///
/// ```ignore
/// let handler = EventObserver::new(|event| {
///     if let AgentEvent::Text { text, .. } = event { println!("{text}"); }
/// });
/// ```
pub struct EventObserver<F>(F)
where
    F: Fn(&AgentEvent<'_>) + Send + Sync;

impl<F> EventObserver<F>
where
    F: Fn(&AgentEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for EventObserver<F>
where
    F: Fn(&AgentEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &AgentEvent<'_>) {
        (self.0)(event);
    }
}

/// An event handler that logs events via `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &AgentEvent<'_>) {
        match event {
            AgentEvent::RoundStart {
                agent,
                round,
                max_rounds,
            } => {
                debug!("[{agent}] round {round}/{max_rounds}");
            }
            AgentEvent::Text { agent, text } => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "[{agent}] engine text: {preview}{}",
                    if text.chars().count() > 200 { "..." } else { "" }
                );
            }
            AgentEvent::ToolCallsReceived {
                agent,
                round,
                count,
            } => {
                debug!("[{agent}] {count} tool call(s) in round {round}");
            }
            // Tool calls themselves are logged at INFO by the ToolSet.
            AgentEvent::ToolExecuting { agent, name, .. } => {
                debug!("[{agent}] executing tool: {name}");
            }
            AgentEvent::ToolResult {
                agent,
                name,
                result,
                ok,
                ..
            } => {
                debug!(
                    "[{agent}] tool {name} {}: {} bytes",
                    if *ok { "ok" } else { "failed" },
                    result.len()
                );
            }
            AgentEvent::TokenUsage { agent, usage } => {
                debug!(
                    "[{agent}] tokens: prompt={}, completion={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }
            AgentEvent::EmptyResponse {
                agent,
                round,
                attempt,
                max_retries,
            } => {
                warn!(
                    "[{agent}] empty engine response at round {round}. Retrying ({attempt}/{max_retries})..."
                );
            }
            AgentEvent::Finished { agent, rounds_used } => {
                info!("[{agent}] finished after {rounds_used} round(s)");
            }
            AgentEvent::RoundLimitReached { agent, max_rounds } => {
                warn!("[{agent}] hit round limit ({max_rounds}); analysis inconclusive");
            }
            AgentEvent::DelegationStarted { agent, target, .. } => {
                info!("[{agent}] delegating to {target}");
            }
            AgentEvent::DelegationFinished { agent, target, ok } => {
                debug!(
                    "[{agent}] {target} returned ({})",
                    if *ok { "ok" } else { "failed" }
                );
            }
            AgentEvent::QueryRefused { agent, query } => {
                info!("[{agent}] refused out-of-domain query: {query}");
            }
        }
    }
}

// ── Run result ─────────────────────────────────────────────────────

/// How a single agent run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The engine produced a final answer.
    Finished,
    /// The round ceiling was reached first.
    Inconclusive,
}

/// One tool call made during a run, with the text the engine saw.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub name: String,
    pub arguments: String,
    pub result: String,
    pub ok: bool,
    pub delegation: bool,
    /// The delegated sub-agent answered without finishing its analysis.
    pub inconclusive: bool,
}

/// The result of a complete [`Harness::run()`](super::harness::Harness::run).
#[derive(Debug)]
pub struct AgentRun {
    pub agent: String,
    pub trace_id: String,
    /// Final answer, or the inconclusive-analysis text.
    pub answer: String,
    pub outcome: RunOutcome,
    pub rounds_used: u32,
    /// Every tool call, in the order the engine requested them.
    pub tool_outcomes: Vec<ToolOutcome>,
    /// All messages exchanged during the run (including the initial ones).
    pub messages: Vec<Message>,
    /// Usage incurred by this run alone (sub-agent usage excluded).
    pub usage: UsageSnapshot,
}

impl AgentRun {
    pub fn finished(&self) -> bool {
        self.outcome == RunOutcome::Finished
    }

    /// Delegation tool calls, successful or not, in production order.
    pub fn delegations(&self) -> impl Iterator<Item = &ToolOutcome> {
        self.tool_outcomes.iter().filter(|o| o.delegation)
    }
}
