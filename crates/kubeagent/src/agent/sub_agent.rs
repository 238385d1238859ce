//! Sub-agents and the tool that exposes them to a routing agent.
//!
//! A [`SubAgent`] is one specialist: its own prompt, its own tools, and its
//! own conversation. It shares only the usage accumulator, the trace ID,
//! and the cancellation token of the query it is serving.
//!
//! [`SubAgentTool`] wraps a sub-agent as a [`Tool`] so the router can call it
//! like any other function. The router's engine is asked to pass the user's
//! question along, but the tool always forwards the original query from the
//! [`ToolContext`] and returns the sub-agent's answer unmodified.

use crate::agent::config::AgentConfig;
use crate::agent::engine::ReasoningEngine;
use crate::agent::events::{AgentRun, EventHandler, NoopHandler, RunOutcome};
use crate::agent::harness::Harness;
use crate::agent::usage::UsageStats;
use crate::error::AgentError;
use crate::tools::core::{Tool, ToolContext, ToolFuture, ToolSet, parse_tool_args};
use crate::tools::spec::{ParamType, ToolSpec, ToolSpecBuilder};
use crate::ToolDef;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Parameter through which the router passes the user's question.
pub const ORIGINAL_QUERY_PARAM: &str = "original_query";

/// A specialist agent with its own tools.
pub struct SubAgent {
    config: AgentConfig,
    tools: ToolSet,
    engine: Arc<dyn ReasoningEngine>,
    event_handler: Arc<dyn EventHandler>,
}

impl SubAgent {
    pub fn new(config: AgentConfig, tools: ToolSet, engine: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            config,
            tools,
            engine,
            event_handler: Arc::new(NoopHandler),
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Answer `query` on its own, recording usage into `usage`.
    pub async fn run(
        &self,
        query: &str,
        usage: &Arc<UsageStats>,
        cancel: &CancellationToken,
    ) -> Result<AgentRun, AgentError> {
        self.harness(Arc::clone(usage), cancel.child_token())
            .run(query)
            .await
    }

    /// Answer the original query carried by a delegating tool call.
    pub async fn run_delegated(&self, ctx: &ToolContext) -> Result<AgentRun, AgentError> {
        self.harness(Arc::clone(&ctx.usage), ctx.cancel.child_token())
            .with_original_query(Arc::clone(&ctx.query))
            .with_trace_id(ctx.trace_id.clone())
            .run(&ctx.query)
            .await
    }

    fn harness(&self, usage: Arc<UsageStats>, cancel: CancellationToken) -> Harness<'_> {
        Harness::new(self.engine.as_ref(), &self.tools, &self.config)
            .with_event_handler(self.event_handler.as_ref())
            .with_usage(usage)
            .with_cancellation(cancel)
    }
}

#[derive(Deserialize)]
struct DelegationArgs {
    #[serde(default)]
    original_query: Option<String>,
}

/// Exposes a [`SubAgent`] as a delegation tool.
///
/// ```ignore
/// let retrieval = SubAgentTool::new(
///     ToolSpec::builder("retrieval_agent")
///         .purpose("Fetch live state from the connected cluster")
///         .when_to_use("The question is about objects that exist right now")
///         .when_not_to_use("General how-to questions; use knowledge_agent"),
///     SubAgent::new(config, cluster_tools, engine.clone()),
/// );
/// ```
pub struct SubAgentTool {
    spec: ToolSpec,
    agent: SubAgent,
}

impl SubAgentTool {
    /// Build the tool. The `original_query` parameter is added to `spec`.
    pub fn new(spec: ToolSpecBuilder, agent: SubAgent) -> Self {
        let spec = spec
            .optional_param(
                ORIGINAL_QUERY_PARAM,
                ParamType::String,
                "The user's question, copied exactly as written. Do not rephrase it.",
            )
            .build();
        Self { spec, agent }
    }

    pub fn agent(&self) -> &SubAgent {
        &self.agent
    }
}

impl Tool for SubAgentTool {
    fn definition(&self) -> ToolDef {
        self.spec.to_tool_def()
    }

    fn execute<'a>(&'a self, ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async move {
            let args: DelegationArgs = parse_tool_args(&self.spec.name, arguments)?;
            if let Some(passed) = args.original_query.as_deref()
                && passed.trim() != ctx.query.trim()
            {
                warn!(
                    "[{}] {} was handed a rewritten query ({passed:?}); forwarding the original",
                    ctx.agent, self.spec.name
                );
            }

            info!(
                "Delegating to sub-agent '{}' (max_rounds={})",
                self.agent.name(),
                self.agent.config().max_rounds
            );
            let start = Instant::now();
            let run = self.agent.run_delegated(ctx).await?;
            info!(
                "Sub-agent '{}' returned in {:.1}s ({} rounds, {:?})",
                self.agent.name(),
                start.elapsed().as_secs_f64(),
                run.rounds_used,
                run.outcome
            );
            if run.outcome == RunOutcome::Inconclusive {
                ctx.mark_inconclusive();
            }
            Ok(run.answer)
        })
    }

    fn name(&self) -> String {
        self.spec.name.clone()
    }

    fn is_delegation(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageRole;
    use crate::agent::scripted::{ScriptStep, ScriptedEngine};
    use serde_json::json;

    fn knowledge(engine: Arc<ScriptedEngine>) -> SubAgentTool {
        SubAgentTool::new(
            ToolSpec::builder("knowledge_agent")
                .purpose("Answer general OpenShift questions")
                .when_to_use("Conceptual questions")
                .when_not_to_use("Live cluster state"),
            SubAgent::new(
                AgentConfig::new("knowledge", "You explain OpenShift."),
                ToolSet::new(),
                engine,
            ),
        )
    }

    #[test]
    fn definition_declares_original_query() {
        let engine = Arc::new(ScriptedEngine::new());
        let def = knowledge(engine).definition();
        assert_eq!(def.function.name, "knowledge_agent");
        assert_eq!(
            def.function.parameters["properties"][ORIGINAL_QUERY_PARAM]["type"],
            "string"
        );
    }

    #[tokio::test]
    async fn forwards_original_query_even_when_rewritten() {
        let engine = Arc::new(
            ScriptedEngine::new()
                .script("knowledge", [ScriptStep::final_answer("A route exposes a service.")]),
        );
        let tool = knowledge(engine.clone());
        let ctx = ToolContext::new("router", "what is a route?");

        let answer = tool
            .execute(&ctx, r#"{"original_query": "explain routes briefly"}"#)
            .await
            .unwrap();
        assert_eq!(answer, "A route exposes a service.");

        let history = &engine.histories_for("knowledge")[0];
        let user = history.iter().find(|m| m.role == MessageRole::User).unwrap();
        assert_eq!(user.content.as_deref(), Some("what is a route?"));
    }

    #[tokio::test]
    async fn usage_is_recorded_into_shared_stats() {
        let engine = Arc::new(
            ScriptedEngine::new()
                .script("knowledge", [ScriptStep::final_answer("ok")])
                .with_usage_per_turn(40, 8),
        );
        let agent = SubAgent::new(
            AgentConfig::new("knowledge", "prompt"),
            ToolSet::new(),
            engine,
        );
        let usage = Arc::new(UsageStats::new());
        let run = agent
            .run("what is a pod?", &usage, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(run.answer, "ok");
        assert_eq!(usage.snapshot().prompt_tokens, 40);
        assert_eq!(run.usage, usage.snapshot());
    }

    #[tokio::test]
    async fn engine_failure_surfaces_as_error() {
        let engine = Arc::new(
            ScriptedEngine::new().script("knowledge", [ScriptStep::Fail("HTTP 503".into())]),
        );
        let tool = knowledge(engine);
        let ctx = ToolContext::new("router", "what is a route?");
        let err = tool.execute(&ctx, "{}").await.unwrap_err();
        assert_eq!(err, AgentError::Engine("HTTP 503".into()));
    }
}
