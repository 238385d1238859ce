//! Assistant configuration from the environment.
//!
//! [`AssistConfig`] reads its settings from environment variables (after
//! loading an optional `.env` file) and assembles the executor, the
//! reasoning engine, and the routing agent with its three sub-agents.

use crate::prompt::{
    REFUSAL_MESSAGE, knowledge_prompt, metrics_prompt, retrieval_prompt, routing_prompt,
};
use crate::tools::{ClusterToolsExt, MetricsClient, MetricsToolsExt};
use kubeagent::agent::config::{AgentConfig, DEFAULT_MAX_ROUNDS};
use kubeagent::agent::engine::{OpenRouterEngine, ReasoningEngine};
use kubeagent::agent::events::{EventHandler, LoggingHandler};
use kubeagent::agent::routing::RoutingAgent;
use kubeagent::agent::sub_agent::{SubAgent, SubAgentTool};
use kubeagent::exec::{CommandExecutor, DEFAULT_COMMAND_TIMEOUT, ExecutorConfig};
use kubeagent::tools::core::ToolSet;
use kubeagent::tools::spec::ToolSpec;
use kubeagent::{DEFAULT_MODEL, OpenRouterClient};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_API_KEY: &str = "OPENROUTER_KEY";
pub const ENV_MODEL: &str = "KUBEAGENT_MODEL";
pub const ENV_BIN_DIR: &str = "KUBEAGENT_BIN_DIR";
pub const ENV_COMMAND_TIMEOUT: &str = "KUBEAGENT_COMMAND_TIMEOUT_SECS";
pub const ENV_MAX_ROUNDS: &str = "KUBEAGENT_MAX_ROUNDS";
pub const ENV_METRICS_URL: &str = "KUBEAGENT_METRICS_URL";
pub const ENV_METRICS_TOP_K: &str = "KUBEAGENT_METRICS_TOP_K";
pub const ENV_METRICS_TIMEOUT: &str = "KUBEAGENT_METRICS_TIMEOUT_SECS";

pub const DEFAULT_METRICS_URL: &str = "http://127.0.0.1:8000/metrics";
pub const DEFAULT_METRICS_TOP_K: u32 = 5;
pub const DEFAULT_METRICS_TIMEOUT: Duration = Duration::from_secs(5);

pub const ROUTER_AGENT: &str = "router";
pub const KNOWLEDGE_AGENT: &str = "knowledge";
pub const RETRIEVAL_AGENT: &str = "retrieval";
pub const METRICS_AGENT: &str = "metrics";

pub const KNOWLEDGE_TOOL: &str = "knowledge_agent";
pub const RETRIEVAL_TOOL: &str = "retrieval_agent";
pub const METRICS_TOOL: &str = "metrics_agent";

/// Settings for one assistant process.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    pub api_key: String,
    /// Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Pinned directory for `oc`, `kube-health` and `yq`. `None` uses `PATH`.
    pub bin_dir: Option<PathBuf>,
    /// Default: 2 seconds.
    pub command_timeout: Duration,
    /// Iteration ceiling for every agent. Default: 10.
    pub max_rounds: u32,
    pub metrics_url: String,
    pub metrics_top_k: u32,
    pub metrics_timeout: Duration,
}

impl AssistConfig {
    /// Defaults with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            bin_dir: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            metrics_url: DEFAULT_METRICS_URL.to_string(),
            metrics_top_k: DEFAULT_METRICS_TOP_K,
            metrics_timeout: DEFAULT_METRICS_TIMEOUT,
        }
    }

    /// Read the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(ENV_API_KEY)
            .ok_or_else(|| format!("{ENV_API_KEY} environment variable is not set"))?;
        let mut config = Self::new(api_key);

        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        config.bin_dir = get(ENV_BIN_DIR).map(PathBuf::from);
        if let Some(secs) = parse_var::<f64>(ENV_COMMAND_TIMEOUT, get(ENV_COMMAND_TIMEOUT))? {
            config.command_timeout = positive_duration(ENV_COMMAND_TIMEOUT, secs)?;
        }
        if let Some(rounds) = parse_var::<u32>(ENV_MAX_ROUNDS, get(ENV_MAX_ROUNDS))? {
            if rounds == 0 {
                return Err(format!("{ENV_MAX_ROUNDS} must be at least 1"));
            }
            config.max_rounds = rounds;
        }
        if let Some(url) = get(ENV_METRICS_URL) {
            config.metrics_url = url;
        }
        if let Some(top_k) = parse_var::<u32>(ENV_METRICS_TOP_K, get(ENV_METRICS_TOP_K))? {
            config.metrics_top_k = top_k;
        }
        if let Some(secs) = parse_var::<f64>(ENV_METRICS_TIMEOUT, get(ENV_METRICS_TIMEOUT))? {
            config.metrics_timeout = positive_duration(ENV_METRICS_TIMEOUT, secs)?;
        }
        Ok(config)
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::default()
            .with_timeout(self.command_timeout)
            .with_bin_dir(self.bin_dir.clone())
    }

    pub fn build_executor(&self) -> CommandExecutor {
        CommandExecutor::new(self.executor_config())
    }

    /// The OpenRouter-backed engine for [`model`](Self::model).
    pub fn build_engine(&self) -> Result<Arc<dyn ReasoningEngine>, String> {
        let client = OpenRouterClient::with_headers(
            self.api_key.clone(),
            "https://github.com/tacryt-socryp/kubeagent",
            "kubeagent",
        )
        .map_err(|e| format!("cannot create the OpenRouter client: {e}"))?;
        Ok(Arc::new(OpenRouterEngine::new(Arc::new(client), self.model.clone())))
    }

    /// Assemble the router and its knowledge, retrieval and metrics agents.
    pub fn build_router(&self, engine: Arc<dyn ReasoningEngine>) -> Result<RoutingAgent, String> {
        let events: Arc<dyn EventHandler> = Arc::new(LoggingHandler);
        let executor = Arc::new(self.build_executor());
        let metrics = MetricsClient::new(
            self.metrics_url.clone(),
            self.metrics_top_k,
            self.metrics_timeout,
        )?;

        let agent = |name: &str, prompt: String, tools: ToolSet| {
            SubAgent::new(
                AgentConfig::new(name, prompt).with_max_rounds(self.max_rounds),
                tools,
                Arc::clone(&engine),
            )
            .with_event_handler(Arc::clone(&events))
        };

        let retrieval_tools = ToolSet::new().with_cluster_tools(executor);
        let metrics_tools = ToolSet::new().with_metrics_tools(metrics);

        let knowledge = SubAgentTool::new(
            ToolSpec::builder(KNOWLEDGE_TOOL)
                .purpose("Answer general OpenShift and Kubernetes knowledge questions")
                .when_to_use("How-to, documentation, concepts and best practices")
                .when_not_to_use("The answer depends on what is running in the user's cluster"),
            agent(KNOWLEDGE_AGENT, knowledge_prompt(), ToolSet::new()),
        );
        let retrieval = SubAgentTool::new(
            ToolSpec::builder(RETRIEVAL_TOOL)
                .purpose("Retrieve information from the running OpenShift cluster")
                .when_to_use("The question is about objects, pods, nodes or health right now")
                .when_not_to_use("General questions that need no cluster access"),
            agent(RETRIEVAL_AGENT, retrieval_prompt(&retrieval_tools), retrieval_tools),
        );
        let metrics = SubAgentTool::new(
            ToolSpec::builder(METRICS_TOOL)
                .purpose("Answer questions about cluster metrics and write PromQL")
                .when_to_use("Usage, utilization, rates, latency or any Prometheus question")
                .when_not_to_use("Questions about object state or configuration"),
            agent(METRICS_AGENT, metrics_prompt(&metrics_tools), metrics_tools),
        );

        Ok(RoutingAgent::new(
            AgentConfig::new(ROUTER_AGENT, routing_prompt()).with_max_rounds(self.max_rounds),
            engine.clone(),
        )
        .with_sub_agent(knowledge)
        .with_sub_agent(retrieval)
        .with_sub_agent(metrics)
        .with_refusal(REFUSAL_MESSAGE)
        .with_event_handler(events))
    }
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| format!("invalid value for {key}: {v:?} ({e})"))
        })
        .transpose()
}

fn positive_duration(key: &str, secs: f64) -> Result<Duration, String> {
    if secs.is_finite() && secs > 0.0 {
        Ok(Duration::from_secs_f64(secs))
    } else {
        Err(format!("{key} must be a positive number of seconds, got {secs}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeagent::agent::scripted::ScriptedEngine;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_with_only_api_key() {
        let config = AssistConfig::from_lookup(lookup(&[(ENV_API_KEY, "sk-test")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.command_timeout, Duration::from_secs(2));
        assert_eq!(config.max_rounds, 10);
        assert_eq!(config.metrics_url, DEFAULT_METRICS_URL);
        assert_eq!(config.metrics_top_k, 5);
        assert!(config.bin_dir.is_none());
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = AssistConfig::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap_err();
        assert!(err.contains(ENV_API_KEY));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AssistConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_MODEL, "openai/gpt-4o-mini"),
            (ENV_BIN_DIR, "/opt/ocp/bin"),
            (ENV_COMMAND_TIMEOUT, "0.5"),
            (ENV_MAX_ROUNDS, "4"),
            (ENV_METRICS_TOP_K, "3"),
        ]))
        .unwrap();
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.bin_dir, Some(PathBuf::from("/opt/ocp/bin")));
        assert_eq!(config.command_timeout, Duration::from_millis(500));
        assert_eq!(config.max_rounds, 4);
        assert_eq!(config.metrics_top_k, 3);
        assert_eq!(config.executor_config().timeout, Duration::from_millis(500));
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        let err = AssistConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_MAX_ROUNDS, "many"),
        ]))
        .unwrap_err();
        assert!(err.contains(ENV_MAX_ROUNDS));

        let err = AssistConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_COMMAND_TIMEOUT, "-1"),
        ]))
        .unwrap_err();
        assert!(err.contains(ENV_COMMAND_TIMEOUT));
    }

    #[test]
    fn router_exposes_three_sub_agents() {
        let router = AssistConfig::new("sk-test")
            .build_router(Arc::new(ScriptedEngine::new()))
            .unwrap();
        assert_eq!(
            router.sub_agent_names(),
            vec![KNOWLEDGE_TOOL, RETRIEVAL_TOOL, METRICS_TOOL]
        );
        assert_eq!(router.refusal(), REFUSAL_MESSAGE);
    }
}
