//! OpenShift/Kubernetes tools for the retrieval and metrics agents.
//!
//! Register them on a [`ToolSet`] with [`ClusterToolsExt`] and
//! [`MetricsToolsExt`].

pub mod cluster;
pub mod health;
pub mod metrics;

pub use cluster::{
    GetNamespaces, GetNonrunningPods, GetObjectClusterWideList, GetObjectDetails,
    GetObjectNamespaceList, GetPodList, GetPodStatus,
};
pub use health::GetObjectHealth;
pub use metrics::{GetExistingMetrics, MetricsClient, NO_METRICS};

use kubeagent::exec::CommandExecutor;
use kubeagent::tools::core::ToolSet;
use std::sync::Arc;

// ── Tool name constants ─────────────────────────────────────────────

pub const GET_NAMESPACES: &str = "get_namespaces";
pub const GET_OBJECT_CLUSTER_WIDE_LIST: &str = "get_object_cluster_wide_list";
pub const GET_OBJECT_NAMESPACE_LIST: &str = "get_object_namespace_list";
pub const GET_NONRUNNING_PODS: &str = "get_nonrunning_pods";
pub const GET_OBJECT_DETAILS: &str = "get_object_details";
pub const GET_POD_LIST: &str = "get_pod_list";
pub const GET_POD_STATUS: &str = "get_pod_status";
pub const GET_OBJECT_HEALTH: &str = "get_object_health";
pub const GET_EXISTING_METRICS: &str = "get_existing_metrics";

// ── Extension traits ────────────────────────────────────────────────

/// Register the read-only cluster tools on a [`ToolSet`].
///
/// ```ignore
/// let executor = Arc::new(CommandExecutor::new(ExecutorConfig::default()));
/// let tools = ToolSet::new().with_cluster_tools(executor);
/// ```
pub trait ClusterToolsExt {
    fn with_cluster_tools(self, executor: Arc<CommandExecutor>) -> Self;
}

impl ClusterToolsExt for ToolSet {
    fn with_cluster_tools(self, executor: Arc<CommandExecutor>) -> Self {
        self.with(GetNamespaces::new(executor.clone()))
            .with(GetObjectClusterWideList::new(executor.clone()))
            .with(GetObjectNamespaceList::new(executor.clone()))
            .with(GetNonrunningPods::new(executor.clone()))
            .with(GetObjectDetails::new(executor.clone()))
            .with(GetPodList::new(executor.clone()))
            .with(GetPodStatus::new(executor.clone()))
            .with(GetObjectHealth::new(executor))
    }
}

/// Register `get_existing_metrics` on a [`ToolSet`].
pub trait MetricsToolsExt {
    fn with_metrics_tools(self, client: MetricsClient) -> Self;
}

impl MetricsToolsExt for ToolSet {
    fn with_metrics_tools(self, client: MetricsClient) -> Self {
        self.with(GetExistingMetrics::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cluster_tools_register_in_order() {
        let tools = ToolSet::new().with_cluster_tools(Arc::new(CommandExecutor::default()));
        assert_eq!(
            tools.names(),
            vec![
                GET_NAMESPACES,
                GET_OBJECT_CLUSTER_WIDE_LIST,
                GET_OBJECT_NAMESPACE_LIST,
                GET_NONRUNNING_PODS,
                GET_OBJECT_DETAILS,
                GET_POD_LIST,
                GET_POD_STATUS,
                GET_OBJECT_HEALTH,
            ]
        );
    }

    #[test]
    fn metrics_tool_registers() {
        let client =
            MetricsClient::new("http://127.0.0.1:8000/metrics", 5, Duration::from_secs(1)).unwrap();
        let tools = ToolSet::new().with_metrics_tools(client);
        assert!(tools.contains(GET_EXISTING_METRICS));
    }
}
