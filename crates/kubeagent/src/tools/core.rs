//! Tool abstraction for function-calling agents.
//!
//! The [`Tool`] trait defines the interface that every tool must implement:
//! a static API definition (name, description, JSON schema) and an async
//! `execute` method. Tools are collected into a [`ToolSet`] which handles
//! ordered registration, argument validation, dispatch, and timeouts.

use crate::ToolDef;
use crate::agent::usage::UsageStats;
use crate::error::AgentError;
use crate::tools::reflection::format_tool_failure;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Result of one tool invocation.
pub type ToolOutput = Result<String, AgentError>;

/// Boxed future returned by [`Tool::execute`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = ToolOutput> + Send + 'a>>;

// ── ToolContext ───────────────────────────────────────────────────

/// Per-invocation context handed to every tool.
///
/// Carries the name of the agent making the call, the user's original
/// query (delegation tools forward it verbatim), the shared usage
/// accumulator, and the cancellation token of the enclosing run.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub agent: String,
    pub query: Arc<str>,
    pub usage: Arc<UsageStats>,
    pub cancel: CancellationToken,
    pub trace_id: String,
    /// Set by a delegation tool whose sub-agent hit its round ceiling.
    /// Fresh for every call; see [`for_call`](Self::for_call).
    pub inconclusive: Arc<AtomicBool>,
}

impl ToolContext {
    /// A standalone context with a fresh usage accumulator and token.
    pub fn new(agent: impl Into<String>, query: impl Into<Arc<str>>) -> Self {
        Self {
            agent: agent.into(),
            query: query.into(),
            usage: Arc::new(UsageStats::new()),
            cancel: CancellationToken::new(),
            trace_id: crate::api::tracing::generate_trace_id(),
            inconclusive: Arc::default(),
        }
    }

    /// A copy for one tool call, with its own inconclusive flag.
    pub fn for_call(&self) -> Self {
        Self {
            inconclusive: Arc::default(),
            ..self.clone()
        }
    }

    pub fn mark_inconclusive(&self) {
        self.inconclusive.store(true, Ordering::Relaxed);
    }

    pub fn is_inconclusive(&self) -> bool {
        self.inconclusive.load(Ordering::Relaxed)
    }
}

// ── Tool trait ─────────────────────────────────────────────────────

/// A tool that an agent can invoke via function-calling.
///
/// Implementors provide:
/// - A static definition ([`Tool::definition`]) describing the tool's name,
///   description, and JSON Schema parameters.
/// - An async [`Tool::execute`] method that receives the validated raw JSON
///   arguments and returns the result text, or a typed [`AgentError`] that
///   the [`ToolSet`] turns into text for the engine.
///
/// # Example
///
/// ```ignore
/// struct GetNamespaces { executor: Arc<CommandExecutor> }
///
/// impl Tool for GetNamespaces {
///     fn definition(&self) -> ToolDef { /* ... */ }
///
///     fn execute<'a>(&'a self, _ctx: &'a ToolContext, _arguments: &'a str) -> ToolFuture<'a> {
///         Box::pin(async move {
///             let result = self.executor.execute(&CommandSpec::argv("oc", ["get", "namespaces"])).await?;
///             Ok(result.to_tool_text())
///         })
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The tool definition sent to the reasoning engine.
    fn definition(&self) -> ToolDef;

    /// Execute the tool with the given raw JSON arguments string.
    ///
    /// Arguments have already been validated against the declared schema.
    /// Uses a boxed future so that the trait is dyn-compatible.
    fn execute<'a>(&'a self, ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a>;

    /// The tool's name (convenience, delegates to definition).
    fn name(&self) -> String {
        self.definition().function.name
    }

    /// Whether this tool hands the query to another agent.
    fn is_delegation(&self) -> bool {
        false
    }
}

// ── ToolSet ────────────────────────────────────────────────────────

/// An ordered collection of tools that can be dispatched by name.
///
/// Registration order is preserved in [`definitions`](Self::definitions).
/// Registering a name twice replaces the earlier tool in place.
///
/// # Example
///
/// ```ignore
/// let tools = ToolSet::new()
///     .with_default_timeout(Some(Duration::from_secs(30)))
///     .with(GetNamespaces::new(executor.clone()))
///     .with(GetExistingMetrics::new(client));
///
/// let defs = tools.definitions();
/// ```
pub struct ToolSet {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
    /// Default timeout for tool execution. `None` disables timeouts.
    default_timeout: Option<Duration>,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl ToolSet {
    /// Create an empty tool set.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            default_timeout: None,
        }
    }

    /// Set a default timeout for tool execution. A per-invocation timeout
    /// takes precedence. Pass `None` to disable.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name();
        match self.index.get(&name) {
            Some(&slot) => {
                debug!("Replacing tool {name}");
                self.tools[slot] = Box::new(tool);
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(Box::new(tool));
            }
        }
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// All tool names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&slot| self.tools[slot].as_ref())
    }

    /// Whether the named tool delegates to another agent.
    pub fn is_delegation_tool(&self, name: &str) -> bool {
        self.get(name).is_some_and(|t| t.is_delegation())
    }

    /// Invoke a tool by name.
    ///
    /// Empty arguments are read as `{}`. Arguments are validated against the
    /// tool's schema before the handler runs. Failures come back as typed
    /// errors; use [`execute`](Self::execute) for the text form.
    pub async fn invoke(
        &self,
        ctx: &ToolContext,
        name: &str,
        arguments: &str,
        timeout: Option<Duration>,
    ) -> ToolOutput {
        let arguments = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };
        log_tool_call(&ctx.agent, name, arguments);
        let start = Instant::now();

        let result = match self.checked(name, arguments) {
            Err(e) => Err(e),
            Ok(tool) => self.run_checked(ctx, tool, name, arguments, timeout, start).await,
        };

        let elapsed = start.elapsed();
        match &result {
            Ok(text) => {
                debug!(
                    "Tool {name} completed in {:.0}ms ({} bytes)",
                    elapsed.as_secs_f64() * 1000.0,
                    text.len()
                );
                trace!(
                    "Tool {name} result preview: {}",
                    text.chars().take(300).collect::<String>()
                );
            }
            Err(e) => info!("[tool] {name} failed ({}): {e}", e.kind()),
        }

        result
    }

    fn checked(&self, name: &str, arguments: &str) -> Result<&dyn Tool, AgentError> {
        let tool = self.get(name).ok_or_else(|| AgentError::UnknownTool {
            name: name.to_string(),
            available: self.names(),
        })?;
        validate_tool_arguments(tool, arguments)?;
        Ok(tool)
    }

    async fn run_checked(
        &self,
        ctx: &ToolContext,
        tool: &dyn Tool,
        name: &str,
        arguments: &str,
        timeout: Option<Duration>,
        start: Instant,
    ) -> ToolOutput {
        match timeout.or(self.default_timeout) {
            Some(limit) => tokio::time::timeout(limit, tool.execute(ctx, arguments))
                .await
                .unwrap_or_else(|_| {
                    info!(
                        "Tool {name} timed out after {:.1}s",
                        start.elapsed().as_secs_f64()
                    );
                    Err(AgentError::Timeout {
                        operation: format!("tool '{name}'"),
                        after: limit,
                    })
                }),
            None => tool.execute(ctx, arguments).await,
        }
    }

    /// Invoke a tool and render any failure as text for the engine.
    pub async fn execute(
        &self,
        ctx: &ToolContext,
        name: &str,
        arguments: &str,
        timeout: Option<Duration>,
    ) -> String {
        match self.invoke(ctx, name, arguments, timeout).await {
            Ok(text) => text,
            Err(e) => format_tool_failure(name, arguments, &e),
        }
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Validate tool arguments against the tool's declared JSON Schema.
pub fn validate_tool_arguments(tool: &dyn Tool, arguments: &str) -> Result<(), AgentError> {
    let name = tool.name();
    let args_value: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| AgentError::invalid_args(&name, format!("arguments are not valid JSON: {e}")))?;

    let schema = tool.definition().function.parameters;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| AgentError::invalid_args(&name, format!("tool schema is invalid: {e}")))?;

    let errors: Vec<String> = validator
        .iter_errors(&args_value)
        .map(|e| format!("{}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AgentError::invalid_args(&name, errors.join("; ")))
    }
}

/// Log a tool call at INFO level with a truncated preview of arguments.
pub fn log_tool_call(agent: &str, name: &str, arguments: &str) {
    let args_preview: String = arguments.chars().take(120).collect();
    info!(
        "[tool] {agent}: {name}({args_preview}{})",
        if arguments.chars().count() > 120 {
            "..."
        } else {
            ""
        }
    );
    trace!("[tool] {name} arguments: {arguments}");
}

/// Parse raw JSON arguments into a typed struct.
pub fn parse_tool_args<T: serde::de::DeserializeOwned>(
    tool: &str,
    arguments: &str,
) -> Result<T, AgentError> {
    serde_json::from_str(arguments).map_err(|e| AgentError::invalid_args(tool, e.to_string()))
}

// ── Tests ──────────────────────────────────────────────────────────
