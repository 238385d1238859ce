//! Configuration for a single agent run.
//!
//! ```ignore
//! let config = AgentConfig::new("retrieval", RETRIEVAL_PROMPT)
//!     .with_max_rounds(8)
//!     .with_tool_timeout(Some(Duration::from_secs(10)));
//! ```

use std::time::Duration;

/// Default iteration ceiling per agent.
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// Identity and loop limits of one agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Name used in logs, events, and the inconclusive-analysis message.
    pub name: String,
    pub system_prompt: String,
    /// Maximum number of engine turns before the run is inconclusive.
    pub max_rounds: u32,
    /// Execute the tool calls of one turn one after another. When `false`,
    /// they run concurrently; results are still recorded in call order.
    pub sequential_tools: bool,
    /// Per-invocation timeout applied when the engine does not set one.
    pub tool_timeout: Option<Duration>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            sequential_tools: true,
            tool_timeout: None,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_sequential_tools(mut self, sequential: bool) -> Self {
        self.sequential_tools = sequential;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}
