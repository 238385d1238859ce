//! Candidate metrics from the similarity service.
//!
//! The service answers `GET {url}?query=PROMPT&top_k=K` with a JSON array
//! whose first element carries a `series` list of metric descriptors. Any
//! failure is logged and turned into an absent result so the metrics agent
//! can still answer from what it knows.

use kubeagent::ToolDef;
use kubeagent::error::AgentError;
use kubeagent::tools::core::{Tool, ToolContext, ToolFuture, parse_tool_args};
use kubeagent::tools::spec::{ParamType, ToolSpec};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Returned when the service has nothing usable.
pub const NO_METRICS: &str = "No existing metrics matched the request.";

const SERVICE: &str = "metrics similarity service";

/// HTTP client for the similarity service.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    http: reqwest::Client,
    url: String,
    top_k: u32,
}

impl MetricsClient {
    pub fn new(url: impl Into<String>, top_k: u32, timeout: Duration) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .user_agent("kubeagent/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build metrics HTTP client: {e}"))?;
        Ok(Self {
            http,
            url: url.into(),
            top_k,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    /// Fetch up to `top_k` metric descriptors similar to `prompt`, one per
    /// line. Strings are returned as-is and objects as compact JSON.
    pub async fn candidates(&self, prompt: &str) -> Result<Vec<String>, AgentError> {
        let upstream = |reason: String| AgentError::UpstreamServiceError {
            service: SERVICE.to_string(),
            reason,
        };

        let top_k = self.top_k.to_string();
        let url = Url::parse_with_params(&self.url, [("query", prompt), ("top_k", top_k.as_str())])
            .map_err(|e| upstream(format!("invalid URL {}: {e}", self.url)))?;
        debug!("metrics: GET {url}");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(upstream(format!("HTTP {status}")));
        }
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| upstream(format!("malformed response: {e}")))?;

        let series = body
            .as_array()
            .and_then(|items| items.first())
            .and_then(|first| first.get("series"))
            .and_then(|series| series.as_array())
            .ok_or_else(|| upstream("response has no series".into()))?;
        if series.is_empty() {
            return Err(upstream("empty series".into()));
        }

        Ok(series
            .iter()
            .map(|s| match s {
                serde_json::Value::String(name) => name.clone(),
                other => other.to_string(),
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct MetricsArgs {
    prompt: String,
}

/// `get_existing_metrics`: never fails; degrades to [`NO_METRICS`].
pub struct GetExistingMetrics {
    client: MetricsClient,
}

impl GetExistingMetrics {
    pub fn new(client: MetricsClient) -> Self {
        Self { client }
    }
}

impl Tool for GetExistingMetrics {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_EXISTING_METRICS)
            .purpose("Find Prometheus metrics in the cluster that relate to {prompt}")
            .when_to_use("Before writing any PromQL, to learn which metric names exist")
            .when_not_to_use("The question is about object state rather than measurements")
            .param(
                "prompt",
                ParamType::String,
                "Natural-language description of what should be measured",
            )
            .example(
                r#"get_existing_metrics(prompt="pod memory usage")"#,
                "container_memory_working_set_bytes\nkube_pod_container_resource_limits",
            )
            .output_format("One metric descriptor per line, or a note that nothing matched")
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async move {
            let args: MetricsArgs = parse_tool_args(super::GET_EXISTING_METRICS, arguments)?;
            match self.client.candidates(&args.prompt).await {
                Ok(lines) => Ok(lines.join("\n")),
                Err(e) => {
                    warn!("get_existing_metrics: {e}");
                    Ok(NO_METRICS.to_string())
                }
            }
        })
    }
}
