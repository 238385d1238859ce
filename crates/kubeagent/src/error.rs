//! Error taxonomy for tool dispatch, sub-agents, and routing.
//!
//! Every variant except [`AgentError::Cancelled`] is recovered at a tool or
//! sub-agent boundary and turned into text for the reasoning engine. See
//! [`ToolSet::execute`](crate::tools::core::ToolSet::execute) and
//! [`format_tool_failure`](crate::tools::reflection::format_tool_failure).

use std::time::Duration;
use thiserror::Error;

/// Errors raised while answering one query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// A required external program is not resolvable.
    #[error("command not found: '{program}' is not available on {searched}")]
    CommandUnavailable { program: String, searched: String },

    /// An external call exceeded its bound.
    #[error("{operation} is unavailable: timed out after {:.1}s", .after.as_secs_f64())]
    Timeout { operation: String, after: Duration },

    #[error("unknown tool '{name}' (available: {})", .available.join(", "))]
    UnknownTool { name: String, available: Vec<String> },

    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Health check produced too little output for the object to exist.
    #[error("The object you are looking for does not exist ({object})")]
    ObjectNotFound { object: String },

    #[error("{service} request failed: {reason}")]
    UpstreamServiceError { service: String, reason: String },

    /// The iteration ceiling was reached without a final answer.
    #[error(
        "Inconclusive analysis: agent '{agent}' used all {rounds} reasoning rounds without reaching a final answer"
    )]
    InconclusiveAnalysis { agent: String, rounds: u32 },

    /// Carries the fixed refusal text.
    #[error("{0}")]
    OutOfDomainQuery(String),

    /// The process could not be started for a reason other than absence.
    #[error("failed to run '{program}': {reason}")]
    ExecutionFailed { program: String, reason: String },

    #[error("reasoning engine failed: {0}")]
    Engine(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AgentError {
    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }

    /// Short taxonomy label, used in logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::CommandUnavailable { .. } => "CommandUnavailable",
            AgentError::Timeout { .. } => "Timeout",
            AgentError::UnknownTool { .. } => "UnknownTool",
            AgentError::InvalidArguments { .. } => "InvalidArguments",
            AgentError::ObjectNotFound { .. } => "ObjectNotFound",
            AgentError::UpstreamServiceError { .. } => "UpstreamServiceError",
            AgentError::InconclusiveAnalysis { .. } => "InconclusiveAnalysis",
            AgentError::OutOfDomainQuery(_) => "OutOfDomainQuery",
            AgentError::ExecutionFailed { .. } => "ExecutionFailed",
            AgentError::Engine(_) => "Engine",
            AgentError::Cancelled => "Cancelled",
        }
    }

    /// The text fed back to the reasoning engine: `Error: <message>`.
    pub fn to_tool_text(&self) -> String {
        format!("Error: {self}")
    }

    pub(crate) fn invalid_args(tool: &str, reason: impl Into<String>) -> Self {
        AgentError::InvalidArguments {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}
