//! Agent harness: the reusable reason-act loop.
//!
//! The [`Harness`] shows the history and tool definitions to a
//! [`ReasoningEngine`], executes any tool calls it proposes via the
//! [`ToolSet`], appends the results verbatim, and repeats until the engine
//! gives a final answer or the round limit is reached. Callers observe the
//! loop via [`EventHandler`] events.

use super::config::AgentConfig;
use super::engine::{EngineRequest, NextAction, ReasoningEngine, ToolInvocation};
use super::events::{AgentEvent, AgentRun, EventHandler, NoopHandler, RunOutcome, ToolOutcome};
use super::usage::{UsageDelta, UsageStats};
use crate::Message;
use crate::error::AgentError;
use crate::tools::core::{ToolContext, ToolSet};
use crate::tools::reflection::format_tool_failure;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Maximum number of retries when the engine returns nothing usable (no
/// text, no tool calls, zero completion tokens).
const MAX_EMPTY_RESPONSE_RETRIES: u32 = 3;

// ── Harness ────────────────────────────────────────────────────────

/// The reason-act loop for one agent.
///
/// ```ignore
/// let tools = ToolSet::new().with(GetNamespaces::new(executor));
/// let config = AgentConfig::new("retrieval", RETRIEVAL_PROMPT);
///
/// let run = Harness::new(&engine, &tools, &config)
///     .with_usage(shared_usage.clone())
///     .with_cancellation(cancel.child_token())
///     .run("list all namespaces")
///     .await?;
///
/// println!("{}", run.answer);
/// ```
///
/// # Lifetimes
///
/// `Harness<'a>` borrows the engine, tools, config, and event handler. Bind
/// them to `let` bindings before building the harness.
pub struct Harness<'a> {
    engine: &'a dyn ReasoningEngine,
    tools: &'a ToolSet,
    config: &'a AgentConfig,
    event_handler: &'a dyn EventHandler,
    /// Shared with every other agent answering the same query.
    usage: Arc<UsageStats>,
    /// This run only.
    run_usage: UsageStats,
    cancel: CancellationToken,
    /// Original top-level query, when this run serves a delegation.
    original_query: Option<Arc<str>>,
    trace_id: Option<String>,
}

impl<'a> Harness<'a> {
    pub fn new(
        engine: &'a dyn ReasoningEngine,
        tools: &'a ToolSet,
        config: &'a AgentConfig,
    ) -> Self {
        Self {
            engine,
            tools,
            config,
            event_handler: &NoopHandler,
            usage: Arc::new(UsageStats::new()),
            run_usage: UsageStats::new(),
            cancel: CancellationToken::new(),
            original_query: None,
            trace_id: None,
        }
    }

    /// Attach an event handler.
    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    /// Record usage into a shared accumulator.
    pub fn with_usage(mut self, usage: Arc<UsageStats>) -> Self {
        self.usage = usage;
        self
    }

    /// Stop the run (and any in-flight tool) when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Tools see `query` as the original query instead of this run's input.
    pub fn with_original_query(mut self, query: Arc<str>) -> Self {
        self.original_query = Some(query);
        self
    }

    /// Reuse a trace ID from an enclosing run.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Run the loop to completion.
    ///
    /// Reaching the round limit is not an error: the run ends with
    /// [`RunOutcome::Inconclusive`] and an explanatory answer. Errors are
    /// engine failures and [`AgentError::Cancelled`].
    pub async fn run(self, query: &str) -> Result<AgentRun, AgentError> {
        let agent = self.config.name.as_str();
        let trace_id = self
            .trace_id
            .clone()
            .unwrap_or_else(crate::api::tracing::generate_trace_id);
        let ctx = ToolContext {
            agent: agent.to_string(),
            query: self
                .original_query
                .clone()
                .unwrap_or_else(|| Arc::from(query)),
            usage: Arc::clone(&self.usage),
            cancel: self.cancel.clone(),
            trace_id: trace_id.clone(),
            inconclusive: Arc::default(),
        };

        info!(
            "Agent run started: agent={agent}, trace_id={trace_id}, engine={}",
            self.engine.name()
        );

        let mut messages = vec![
            Message::system(&self.config.system_prompt),
            Message::user(query),
        ];
        let tool_defs = self.tools.definitions();
        let mut tool_outcomes = Vec::new();
        let mut last_text: Option<String> = None;
        let mut answer: Option<String> = None;
        let mut empty_response_retries: u32 = 0;
        let mut rounds_used = 0;

        for round in 0..self.config.max_rounds {
            rounds_used = round + 1;
            self.event_handler.on_event(&AgentEvent::RoundStart {
                agent,
                round: rounds_used,
                max_rounds: self.config.max_rounds,
            });

            let request = EngineRequest {
                agent,
                history: &messages,
                tools: &tool_defs,
            };
            let turn = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(AgentError::Cancelled),
                turn = self.engine.propose_next_action(request) => turn?,
            };

            self.record_usage(agent, turn.usage);

            if let Some(text) = turn.text.as_deref().filter(|t| !t.is_empty()) {
                self.event_handler.on_event(&AgentEvent::Text { agent, text });
                last_text = Some(text.to_string());
            }

            let is_empty = match &turn.action {
                NextAction::FinalAnswer(text) => text.trim().is_empty(),
                NextAction::CallTools(calls) => calls.is_empty(),
            } && turn.usage.completion_tokens == 0;

            if is_empty {
                empty_response_retries += 1;
                if empty_response_retries <= MAX_EMPTY_RESPONSE_RETRIES {
                    self.event_handler.on_event(&AgentEvent::EmptyResponse {
                        agent,
                        round: rounds_used,
                        attempt: empty_response_retries,
                        max_retries: MAX_EMPTY_RESPONSE_RETRIES,
                    });
                    tokio::time::sleep(Duration::from_millis(
                        500 * u64::from(empty_response_retries),
                    ))
                    .await;
                    continue;
                }
                warn!(
                    "[{agent}] empty engine response persisted after {MAX_EMPTY_RESPONSE_RETRIES} retries. Treating as completion."
                );
            }

            let calls = match turn.action {
                NextAction::FinalAnswer(text) => {
                    messages.push(Message::assistant_text(&text));
                    answer = Some(text);
                    break;
                }
                NextAction::CallTools(calls) if calls.is_empty() => {
                    answer = Some(last_text.clone().unwrap_or_default());
                    break;
                }
                NextAction::CallTools(calls) => calls,
            };
            empty_response_retries = 0;

            self.event_handler.on_event(&AgentEvent::ToolCallsReceived {
                agent,
                round: rounds_used,
                count: calls.len(),
            });
            messages.push(Message::assistant_tool_calls(
                calls.iter().map(ToolInvocation::to_tool_call).collect(),
                turn.text,
            ));

            let outcomes = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(AgentError::Cancelled),
                outcomes = self.dispatch(&ctx, &calls) => outcomes?,
            };

            for (call, outcome) in calls.iter().zip(outcomes) {
                messages.push(Message::tool_result(&call.id, &outcome.result));
                tool_outcomes.push(outcome);
            }
        }

        let (answer, outcome) = match answer {
            Some(answer) => {
                self.event_handler
                    .on_event(&AgentEvent::Finished { agent, rounds_used });
                (answer, RunOutcome::Finished)
            }
            None => {
                self.event_handler.on_event(&AgentEvent::RoundLimitReached {
                    agent,
                    max_rounds: self.config.max_rounds,
                });
                let inconclusive = AgentError::InconclusiveAnalysis {
                    agent: agent.to_string(),
                    rounds: self.config.max_rounds,
                };
                let answer = match last_text {
                    Some(partial) => format!("{inconclusive}\n\nPartial findings:\n{partial}"),
                    None => inconclusive.to_string(),
                };
                (answer, RunOutcome::Inconclusive)
            }
        };

        info!(
            "Agent run finished: agent={agent}, trace_id={trace_id}, rounds={rounds_used}, outcome={outcome:?}"
        );

        Ok(AgentRun {
            agent: agent.to_string(),
            trace_id,
            answer,
            outcome,
            rounds_used,
            tool_outcomes,
            messages,
            usage: self.run_usage.snapshot(),
        })
    }

    fn record_usage(&self, agent: &str, usage: UsageDelta) {
        self.usage.record(usage);
        self.run_usage.record(usage);
        if usage != UsageDelta::default() {
            self.event_handler
                .on_event(&AgentEvent::TokenUsage { agent, usage });
        }
    }

    /// Execute one turn's tool calls. Outcomes are returned in call order.
    async fn dispatch(
        &self,
        ctx: &ToolContext,
        calls: &[ToolInvocation],
    ) -> Result<Vec<ToolOutcome>, AgentError> {
        if self.config.sequential_tools {
            let mut outcomes = Vec::with_capacity(calls.len());
            for call in calls {
                outcomes.push(self.dispatch_one(ctx, call).await?);
            }
            Ok(outcomes)
        } else {
            futures::future::join_all(calls.iter().map(|call| self.dispatch_one(ctx, call)))
                .await
                .into_iter()
                .collect()
        }
    }

    async fn dispatch_one(
        &self,
        ctx: &ToolContext,
        call: &ToolInvocation,
    ) -> Result<ToolOutcome, AgentError> {
        let agent = ctx.agent.as_str();
        let delegation = self.tools.is_delegation_tool(&call.name);

        self.event_handler.on_event(&AgentEvent::ToolExecuting {
            agent,
            name: &call.name,
            arguments: &call.arguments,
        });
        if delegation {
            self.event_handler.on_event(&AgentEvent::DelegationStarted {
                agent,
                target: &call.name,
                query: &ctx.query,
            });
        }
        self.usage.record_tool_call();
        self.run_usage.record_tool_call();

        let timeout = call.timeout.or(self.config.tool_timeout);
        let call_ctx = ctx.for_call();
        let (result, ok) = match self
            .tools
            .invoke(&call_ctx, &call.name, &call.arguments, timeout)
            .await
        {
            Ok(text) => (text, true),
            Err(AgentError::Cancelled) => return Err(AgentError::Cancelled),
            Err(e) => (format_tool_failure(&call.name, &call.arguments, &e), false),
        };

        self.event_handler.on_event(&AgentEvent::ToolResult {
            agent,
            name: &call.name,
            call_id: &call.id,
            result: &result,
            ok,
        });
        if delegation {
            self.event_handler.on_event(&AgentEvent::DelegationFinished {
                agent,
                target: &call.name,
                ok,
            });
        }

        Ok(ToolOutcome {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result,
            ok,
            delegation,
            inconclusive: call_ctx.is_inconclusive(),
        })
    }
}
