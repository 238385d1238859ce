//! The routing agent: the single entry point for a user question.
//!
//! The router's only tools are sub-agents. It refuses questions outside the
//! cluster domain without delegating, otherwise lets its engine pick which
//! specialists to consult. The final answer is the specialists' outputs,
//! unmodified, joined in the order they were produced.

use crate::agent::config::AgentConfig;
use crate::agent::engine::ReasoningEngine;
use crate::agent::events::{
    AgentEvent, AgentRun, EventHandler, NoopHandler, RunOutcome, ToolOutcome,
};
use crate::agent::harness::Harness;
use crate::agent::sub_agent::SubAgentTool;
use crate::agent::usage::{UsageSnapshot, UsageStats};
use crate::api::tracing::generate_trace_id;
use crate::error::AgentError;
use crate::tools::core::ToolSet;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Answer given to questions outside the supported domain.
pub const DEFAULT_REFUSAL: &str =
    "I can only help with questions about OpenShift and Kubernetes clusters.";

/// Answer given when no agent produced any text.
pub const NO_ANSWER: &str = "The assistant produced no answer.";

/// Terms that mark a question as being about a cluster.
const DOMAIN_TERMS: &[&str] = &[
    "kubernetes", "k8s", "openshift", "ocp", "oc", "kubectl", "cluster", "node", "namespace",
    "project", "pod", "container", "deployment", "deploymentconfig", "replicaset",
    "statefulset", "daemonset", "job", "cronjob", "service", "route", "ingress", "configmap",
    "secret", "pvc", "pv", "persistentvolume", "persistentvolumeclaim", "storageclass",
    "operator", "crd", "helm", "image", "imagestream", "build", "buildconfig", "rbac", "role",
    "rolebinding", "serviceaccount", "quota", "limitrange", "hpa", "autoscaler", "etcd",
    "apiserver", "kubelet", "crashloopbackoff", "oomkilled", "imagepullbackoff", "evicted",
    "restart", "replica", "scale", "rollout", "cpu", "memory", "metric", "prometheus", "alert",
    "alertmanager", "thanos", "latency", "utilization", "workload", "health", "healthy",
    "unhealthy", "log", "event", "manifest", "yaml", "label", "taint", "toleration",
    "machineconfig", "machineset", "networkpolicy", "ovn", "dns", "certificate", "csr",
    "upgrade",
];

/// Keyword gate applied before the router's engine sees a question.
///
/// A question is admitted when any word (or its plural) is a domain term.
/// The gate is deliberately permissive; the router prompt handles the rest.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    terms: HashSet<String>,
    enabled: bool,
}

impl Default for ScopeGuard {
    fn default() -> Self {
        Self {
            terms: DOMAIN_TERMS.iter().map(|t| (*t).to_string()).collect(),
            enabled: true,
        }
    }
}

impl ScopeGuard {
    /// Admit every question.
    pub fn disabled() -> Self {
        Self {
            terms: HashSet::new(),
            enabled: false,
        }
    }

    /// Extend the vocabulary.
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.terms
            .extend(terms.into_iter().map(|t| t.as_ref().to_lowercase()));
        self
    }

    pub fn admits(&self, query: &str) -> bool {
        if !self.enabled {
            return true;
        }
        query
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| self.is_term(word))
    }

    fn is_term(&self, word: &str) -> bool {
        if self.terms.contains(word) {
            return true;
        }
        ["es", "s"].iter().any(|suffix| {
            word.strip_suffix(suffix)
                .is_some_and(|stem| !stem.is_empty() && self.terms.contains(stem))
        })
    }
}

/// How a routed query ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    /// A round ceiling was reached; the answer carries partial findings.
    Inconclusive,
    Refused,
    /// The router's own engine failed.
    Failed(String),
}

/// The answer to one user question.
#[derive(Debug, Clone)]
pub struct RoutedAnswer {
    pub answer: String,
    pub outcome: Outcome,
    /// Usage of the router and every sub-agent it consulted.
    pub usage: UsageSnapshot,
    pub trace_id: String,
}

impl fmt::Display for RoutedAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.answer)
    }
}

/// Entry point that classifies a question and delegates to sub-agents.
///
/// ```ignore
/// let router = RoutingAgent::new(AgentConfig::new("router", ROUTING_PROMPT), engine.clone())
///     .with_sub_agent(knowledge_tool)
///     .with_sub_agent(retrieval_tool)
///     .with_sub_agent(metrics_tool);
///
/// let answer = router.run("list all namespaces", CancellationToken::new()).await?;
/// println!("{answer}\n\n{}", answer.usage);
/// ```
pub struct RoutingAgent {
    config: AgentConfig,
    tools: ToolSet,
    engine: Arc<dyn ReasoningEngine>,
    scope: ScopeGuard,
    refusal: String,
    event_handler: Arc<dyn EventHandler>,
}

impl RoutingAgent {
    pub fn new(config: AgentConfig, engine: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            config,
            tools: ToolSet::new(),
            engine,
            scope: ScopeGuard::default(),
            refusal: DEFAULT_REFUSAL.to_string(),
            event_handler: Arc::new(NoopHandler),
        }
    }

    /// Make a sub-agent available to the router.
    pub fn with_sub_agent(mut self, tool: SubAgentTool) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn with_scope_guard(mut self, scope: ScopeGuard) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_refusal(mut self, refusal: impl Into<String>) -> Self {
        self.refusal = refusal.into();
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    /// Names of the delegation tools, in registration order.
    pub fn sub_agent_names(&self) -> Vec<String> {
        self.tools.names()
    }

    pub fn refusal(&self) -> &str {
        &self.refusal
    }

    /// Answer one question.
    ///
    /// Only [`AgentError::Cancelled`] is returned as an error. Every other
    /// failure is reported in the [`RoutedAnswer`].
    pub async fn run(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<RoutedAnswer, AgentError> {
        let agent = self.config.name.as_str();
        let usage = Arc::new(UsageStats::new());
        let trace_id = generate_trace_id();

        if !self.scope.admits(query) {
            self.event_handler
                .on_event(&AgentEvent::QueryRefused { agent, query });
            let refusal = AgentError::OutOfDomainQuery(self.refusal.clone());
            info!("Refusing query: trace_id={trace_id}, query={query:?}");
            return Ok(RoutedAnswer {
                answer: refusal.to_string(),
                outcome: Outcome::Refused,
                usage: usage.snapshot(),
                trace_id,
            });
        }

        info!("Routing query: trace_id={trace_id}, query={query:?}");
        let result = Harness::new(self.engine.as_ref(), &self.tools, &self.config)
            .with_event_handler(self.event_handler.as_ref())
            .with_usage(Arc::clone(&usage))
            .with_cancellation(cancel)
            .with_trace_id(trace_id.clone())
            .run(query)
            .await;

        let (answer, outcome) = match result {
            Ok(run) => self.compose(&run),
            Err(AgentError::Cancelled) => return Err(AgentError::Cancelled),
            Err(e) => (e.to_tool_text(), Outcome::Failed(e.to_string())),
        };

        Ok(RoutedAnswer {
            answer,
            outcome,
            usage: usage.snapshot(),
            trace_id,
        })
    }

    /// Once any sub-agent answered, the answer is every delegation result in
    /// production order, failures included, so sub-agent output reaches the
    /// user unmodified. The router's own text is used only when no
    /// delegation succeeded, or to state that the routing was inconclusive.
    fn compose(&self, run: &AgentRun) -> (String, Outcome) {
        let delegations: Vec<&ToolOutcome> = run.delegations().collect();
        let answered: Vec<&ToolOutcome> = delegations.iter().copied().filter(|o| o.ok).collect();
        let mut outcome = match run.outcome {
            RunOutcome::Finished => Outcome::Answered,
            RunOutcome::Inconclusive => Outcome::Inconclusive,
        };

        if !answered.is_empty() {
            if answered.iter().all(|o| o.inconclusive) {
                outcome = Outcome::Inconclusive;
            }
            let mut parts: Vec<&str> = delegations.iter().map(|o| o.result.as_str()).collect();
            if run.outcome == RunOutcome::Inconclusive {
                parts.push(&run.answer);
            }
            return (parts.join("\n\n"), outcome);
        }

        let answer = run.answer.trim();
        if answer.is_empty() {
            (NO_ANSWER.to_string(), outcome)
        } else if answer == self.refusal {
            (self.refusal.clone(), Outcome::Refused)
        } else {
            (run.answer.clone(), outcome)
        }
    }
}
