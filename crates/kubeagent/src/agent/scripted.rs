//! A deterministic [`ReasoningEngine`] driven by per-agent scripts.
//!
//! Used in tests and demos to exercise the full routing and tool-dispatch
//! path without a model. One engine can serve several agents: each agent
//! name gets its own queue of [`ScriptStep`]s.
//!
//! ```ignore
//! let engine = ScriptedEngine::new()
//!     .script("router", [
//!         ScriptStep::call("retrieval_agent", json!({"original_query": "list all namespaces"})),
//!         ScriptStep::EchoLastToolResult,
//!     ])
//!     .script("retrieval", [
//!         ScriptStep::call("get_namespaces", json!({})),
//!         ScriptStep::EchoLastToolResult,
//!     ]);
//! ```

use crate::agent::engine::{
    EngineFuture, EngineRequest, EngineTurn, NextAction, ReasoningEngine, ToolInvocation,
};
use crate::agent::usage::UsageDelta;
use crate::error::AgentError;
use crate::{Message, MessageRole};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// One scripted engine decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Call these tools, as `(name, raw JSON arguments)`.
    Call(Vec<(String, String)>),
    Final(String),
    /// Finish with the content of the most recent tool result, verbatim.
    EchoLastToolResult,
    /// Fail the engine call with this message.
    Fail(String),
}

impl ScriptStep {
    /// Call a single tool.
    pub fn call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        ScriptStep::Call(vec![(name.into(), arguments.to_string())])
    }

    /// Call several tools in one turn.
    pub fn calls<I, S>(calls: I) -> Self
    where
        I: IntoIterator<Item = (S, serde_json::Value)>,
        S: Into<String>,
    {
        ScriptStep::Call(
            calls
                .into_iter()
                .map(|(name, args)| (name.into(), args.to_string()))
                .collect(),
        )
    }

    pub fn final_answer(text: impl Into<String>) -> Self {
        ScriptStep::Final(text.into())
    }
}

#[derive(Debug, Default)]
struct AgentScript {
    steps: VecDeque<ScriptStep>,
    /// Served forever once `steps` runs out.
    repeat: Option<ScriptStep>,
}

/// Scripted [`ReasoningEngine`]. Records every history it is shown.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    scripts: Mutex<HashMap<String, AgentScript>>,
    usage_per_turn: UsageDelta,
    seen: Mutex<Vec<(String, Vec<Message>)>>,
    next_call_id: AtomicU64,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append steps to `agent`'s script.
    pub fn script(
        self,
        agent: impl Into<String>,
        steps: impl IntoIterator<Item = ScriptStep>,
    ) -> Self {
        self.lock_scripts()
            .entry(agent.into())
            .or_default()
            .steps
            .extend(steps);
        self
    }

    /// Once `agent`'s script is exhausted, serve `step` on every turn.
    pub fn then_repeat(self, agent: impl Into<String>, step: ScriptStep) -> Self {
        self.lock_scripts().entry(agent.into()).or_default().repeat = Some(step);
        self
    }

    /// Report this many tokens on every turn.
    pub fn with_usage_per_turn(mut self, prompt_tokens: u64, completion_tokens: u64) -> Self {
        self.usage_per_turn = UsageDelta::request(prompt_tokens, completion_tokens);
        self
    }

    /// Number of turns served to `agent`.
    pub fn turns_for(&self, agent: &str) -> usize {
        self.lock_seen().iter().filter(|(a, _)| a == agent).count()
    }

    /// Histories shown to `agent`, one per turn.
    pub fn histories_for(&self, agent: &str) -> Vec<Vec<Message>> {
        self.lock_seen()
            .iter()
            .filter(|(a, _)| a == agent)
            .map(|(_, h)| h.clone())
            .collect()
    }

    fn lock_scripts(&self) -> std::sync::MutexGuard<'_, HashMap<String, AgentScript>> {
        self.scripts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_seen(&self) -> std::sync::MutexGuard<'_, Vec<(String, Vec<Message>)>> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_step(&self, agent: &str) -> Result<ScriptStep, AgentError> {
        let mut scripts = self.lock_scripts();
        let script = scripts
            .get_mut(agent)
            .ok_or_else(|| AgentError::Engine(format!("no script for agent '{agent}'")))?;
        script
            .steps
            .pop_front()
            .or_else(|| script.repeat.clone())
            .ok_or_else(|| AgentError::Engine(format!("script exhausted for agent '{agent}'")))
    }

    fn turn(&self, request: EngineRequest<'_>) -> Result<EngineTurn, AgentError> {
        self.lock_seen()
            .push((request.agent.to_string(), request.history.to_vec()));

        let action = match self.next_step(request.agent)? {
            ScriptStep::Call(calls) => NextAction::CallTools(
                calls
                    .into_iter()
                    .map(|(name, args)| {
                        let id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
                        ToolInvocation::new(format!("call_{id}"), name, args)
                    })
                    .collect(),
            ),
            ScriptStep::Final(text) => NextAction::FinalAnswer(text),
            ScriptStep::EchoLastToolResult => NextAction::FinalAnswer(
                request
                    .history
                    .iter()
                    .rev()
                    .find(|m| m.role == MessageRole::Tool)
                    .and_then(|m| m.content.clone())
                    .unwrap_or_default(),
            ),
            ScriptStep::Fail(message) => return Err(AgentError::Engine(message)),
        };

        Ok(EngineTurn {
            action,
            text: None,
            usage: self.usage_per_turn,
        })
    }
}

impl ReasoningEngine for ScriptedEngine {
    fn propose_next_action<'a>(&'a self, request: EngineRequest<'a>) -> EngineFuture<'a> {
        let turn = self.turn(request);
        Box::pin(async move { turn })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
