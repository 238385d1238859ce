//! Read-only cluster inspection tools backed by `oc`.
//!
//! | Tool | Name | Command |
//! |------|------|---------|
//! | [`GetNamespaces`] | `get_namespaces` | `oc get namespaces` |
//! | [`GetObjectClusterWideList`] | `get_object_cluster_wide_list` | `oc get KIND -A -o name` |
//! | [`GetObjectNamespaceList`] | `get_object_namespace_list` | `oc get KIND -n NS -o name` |
//! | [`GetNonrunningPods`] | `get_nonrunning_pods` | `oc get pods -A --field-selector status.phase!=Running ...` |
//! | [`GetObjectDetails`] | `get_object_details` | `oc get KIND -n NS NAME -o yaml` |
//! | [`GetPodList`] | `get_pod_list` | `oc get pods -n NS -o name` |
//! | [`GetPodStatus`] | `get_pod_status` | `oc get pod ... -o jsonpath='{.status}' \| yq -p json -o yaml` |
//!
//! Every handler runs exactly one command and returns its stdout verbatim.

use kubeagent::ToolDef;
use kubeagent::error::AgentError;
use kubeagent::exec::{CommandExecutor, CommandSpec, shell_quote};
use kubeagent::tools::core::{Tool, ToolContext, ToolFuture, ToolOutput, parse_tool_args};
use kubeagent::tools::spec::{ParamType, ToolSpec};
use serde::Deserialize;
use std::sync::Arc;

/// The cluster CLI.
pub const OC: &str = "oc";
/// YAML converter used by `get_pod_status`.
pub const YQ: &str = "yq";

// ── Helpers ─────────────────────────────────────────────────────────

/// Run one command and render its result for the engine.
pub(crate) async fn run(executor: &CommandExecutor, command: CommandSpec) -> ToolOutput {
    Ok(executor.execute(&command).await?.to_tool_text())
}

fn oc<const N: usize>(args: [&str; N]) -> CommandSpec {
    CommandSpec::argv(OC, args)
}

/// Check a kind, name or namespace before it reaches a command line.
///
/// Values must be non-empty, must not look like a flag, and may only
/// contain ASCII letters, digits, `.`, `_`, `/` and `-`.
pub fn validate_object_ref(tool: &str, field: &str, value: &str) -> Result<(), AgentError> {
    let invalid = |reason: String| AgentError::InvalidArguments {
        tool: tool.to_string(),
        reason,
    };
    if value.is_empty() {
        return Err(invalid(format!("'{field}' must not be empty")));
    }
    if value.starts_with('-') {
        return Err(invalid(format!("'{field}' must not start with '-': {value:?}")));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-')))
    {
        return Err(invalid(format!(
            "'{field}' contains invalid character {bad:?}: {value:?}"
        )));
    }
    Ok(())
}

// ── get_namespaces ──────────────────────────────────────────────────

/// List every namespace in the cluster.
pub struct GetNamespaces {
    executor: Arc<CommandExecutor>,
}

impl GetNamespaces {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl Tool for GetNamespaces {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_NAMESPACES)
            .purpose("Get the list of namespaces in the cluster")
            .when_to_use("The question is about which namespaces or projects exist")
            .when_not_to_use(
                "You already know the namespace; list its objects with get_object_namespace_list",
            )
            .example(
                "get_namespaces()",
                "NAME                STATUS   AGE\ndefault             Active   41d",
            )
            .output_format("The `oc get namespaces` table, unmodified")
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, _arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(run(&self.executor, oc(["get", "namespaces"])))
    }
}

// ── get_object_cluster_wide_list ────────────────────────────────────

#[derive(Deserialize)]
struct KindArgs {
    kind: String,
}

/// List every object of one kind across all namespaces.
pub struct GetObjectClusterWideList {
    executor: Arc<CommandExecutor>,
}

impl GetObjectClusterWideList {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl Tool for GetObjectClusterWideList {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_OBJECT_CLUSTER_WIDE_LIST)
            .purpose("Fetch every instance of object type {kind} in the whole cluster")
            .when_to_use("You need all objects of a kind and the namespace is unknown")
            .when_not_to_use("The namespace is known; use get_object_namespace_list")
            .param("kind", ParamType::String, "The Kubernetes/OpenShift object type, e.g. pods or deployments")
            .example(
                r#"get_object_cluster_wide_list(kind="deployments")"#,
                "deployment.apps/console\ndeployment.apps/downloads",
            )
            .output_format("One KIND/NAME per line")
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async move {
            let tool = super::GET_OBJECT_CLUSTER_WIDE_LIST;
            let args: KindArgs = parse_tool_args(tool, arguments)?;
            validate_object_ref(tool, "kind", &args.kind)?;
            run(&self.executor, oc(["get", args.kind.as_str(), "-A", "-o", "name"])).await
        })
    }
}

// ── get_object_namespace_list ───────────────────────────────────────

#[derive(Deserialize)]
struct KindInNamespaceArgs {
    kind: String,
    namespace: String,
}

/// List every object of one kind in one namespace.
pub struct GetObjectNamespaceList {
    executor: Arc<CommandExecutor>,
}

impl GetObjectNamespaceList {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl Tool for GetObjectNamespaceList {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_OBJECT_NAMESPACE_LIST)
            .purpose("Fetch every instance of object type {kind} in {namespace}")
            .when_to_use("You know the namespace and need its objects of one kind")
            .when_not_to_use("The namespace is unknown; use get_object_cluster_wide_list")
            .param("kind", ParamType::String, "The Kubernetes/OpenShift object type")
            .param("namespace", ParamType::String, "The namespace containing the objects")
            .example(
                r#"get_object_namespace_list(kind="pods", namespace="openshift-dns")"#,
                "pod/dns-default-4xk2p\npod/node-resolver-8q6mz",
            )
            .output_format("One KIND/NAME per line")
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async move {
            let tool = super::GET_OBJECT_NAMESPACE_LIST;
            let args: KindInNamespaceArgs = parse_tool_args(tool, arguments)?;
            validate_object_ref(tool, "kind", &args.kind)?;
            validate_object_ref(tool, "namespace", &args.namespace)?;
            run(
                &self.executor,
                oc(["get", args.kind.as_str(), "-n", args.namespace.as_str(), "-o", "name"]),
            )
            .await
        })
    }
}

// ── get_nonrunning_pods ─────────────────────────────────────────────

/// List pods whose phase is anything but `Running`.
pub struct GetNonrunningPods {
    executor: Arc<CommandExecutor>,
}

impl GetNonrunningPods {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl Tool for GetNonrunningPods {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_NONRUNNING_PODS)
            .purpose("Get the pods in the cluster that are not currently running")
            .when_to_use(
                "Looking for failing or stuck workloads. A pod that is not running is not \
                 necessarily broken; check its status to learn why",
            )
            .when_not_to_use("You need every pod regardless of phase; use get_pod_list")
            .output_format("NAMESPACE and NAME columns")
            .disambiguate(
                "Why is one specific pod not running",
                super::GET_POD_STATUS,
                "it shows the pod's conditions and container states",
            )
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, _arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(run(
            &self.executor,
            oc([
                "get",
                "pods",
                "-A",
                "--field-selector",
                "status.phase!=Running",
                "-o",
                "custom-columns=NAMESPACE:.metadata.namespace,NAME:.metadata.name",
            ]),
        ))
    }
}

// ── get_object_details ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ObjectArgs {
    namespace: String,
    kind: String,
    name: String,
}

/// Full YAML of one object.
pub struct GetObjectDetails {
    executor: Arc<CommandExecutor>,
}

impl GetObjectDetails {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl Tool for GetObjectDetails {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_OBJECT_DETAILS)
            .purpose("Fetch the full definition of {kind} {name} in {namespace}")
            .when_to_use("You need the spec, status or events-related fields of one object")
            .when_not_to_use("You only need a pod's status block; use get_pod_status")
            .param("namespace", ParamType::String, "The namespace where the object is")
            .param("kind", ParamType::String, "The kind of the object")
            .param("name", ParamType::String, "The name of the object")
            .output_format("YAML")
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async move {
            let tool = super::GET_OBJECT_DETAILS;
            let args: ObjectArgs = parse_tool_args(tool, arguments)?;
            validate_object_ref(tool, "namespace", &args.namespace)?;
            validate_object_ref(tool, "kind", &args.kind)?;
            validate_object_ref(tool, "name", &args.name)?;
            run(
                &self.executor,
                oc([
                    "get",
                    args.kind.as_str(),
                    "-n",
                    args.namespace.as_str(),
                    args.name.as_str(),
                    "-o",
                    "yaml",
                ]),
            )
            .await
        })
    }
}

// ── get_pod_list ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NamespaceArgs {
    namespace: String,
}

pub struct GetPodList {
    executor: Arc<CommandExecutor>,
}

impl GetPodList {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl Tool for GetPodList {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_POD_LIST)
            .purpose("Get the list of pods in {namespace}")
            .when_to_use("You need the pods of one namespace")
            .when_not_to_use("You only want pods that are not running; use get_nonrunning_pods")
            .param("namespace", ParamType::String, "The namespace to list pods from")
            .output_format("One pod/NAME per line")
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async move {
            let tool = super::GET_POD_LIST;
            let args: NamespaceArgs = parse_tool_args(tool, arguments)?;
            validate_object_ref(tool, "namespace", &args.namespace)?;
            run(
                &self.executor,
                oc(["get", "pods", "-n", args.namespace.as_str(), "-o", "name"]),
            )
            .await
        })
    }
}

// ── get_pod_status ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct PodArgs {
    namespace: String,
    pod: String,
}

/// The status block of one pod, converted from JSON to YAML by `yq`.
pub struct GetPodStatus {
    executor: Arc<CommandExecutor>,
}

impl GetPodStatus {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }

    fn command(namespace: &str, pod: &str) -> CommandSpec {
        CommandSpec::shell(
            format!(
                "{OC} get pod -n {} {} -o jsonpath='{{.status}}' | {YQ} -p json -o yaml",
                shell_quote(namespace),
                shell_quote(pod)
            ),
            [OC, YQ],
        )
    }
}

impl Tool for GetPodStatus {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_POD_STATUS)
            .purpose("Return only the status object of {pod} in {namespace}")
            .when_to_use("You need to know why one pod is pending, failing or restarting")
            .when_not_to_use("You need the whole pod definition; use get_object_details")
            .param("namespace", ParamType::String, "The namespace where the pod exists")
            .param("pod", ParamType::String, "The name of the pod")
            .output_format("YAML status block")
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async move {
            let tool = super::GET_POD_STATUS;
            let args: PodArgs = parse_tool_args(tool, arguments)?;
            validate_object_ref(tool, "namespace", &args.namespace)?;
            validate_object_ref(tool, "pod", &args.pod)?;
            run(&self.executor, Self::command(&args.namespace, &args.pod)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_refs_are_validated() {
        assert!(validate_object_ref("t", "kind", "deployments.apps").is_ok());
        assert!(validate_object_ref("t", "name", "pod/web-1").is_ok());

        let err = validate_object_ref("t", "kind", "").unwrap_err();
        assert!(err.to_string().contains("'kind' must not be empty"));

        let err = validate_object_ref("t", "namespace", "--all-namespaces").unwrap_err();
        assert!(err.to_string().contains("must not start with '-'"));

        let err = validate_object_ref("t", "pod", "web; rm -rf /").unwrap_err();
        assert!(matches!(err, AgentError::InvalidArguments { .. }));
    }

    #[test]
    fn pod_status_pipeline_quotes_arguments() {
        let command = GetPodStatus::command("default", "web-1");
        assert_eq!(
            command,
            CommandSpec::shell(
                "oc get pod -n 'default' 'web-1' -o jsonpath='{.status}' | yq -p json -o yaml",
                ["oc", "yq"],
            )
        );
    }

    #[test]
    fn specs_reference_only_declared_parameters() {
        let executor = Arc::new(CommandExecutor::default());
        let defs = [
            GetNamespaces::new(executor.clone()).definition(),
            GetObjectClusterWideList::new(executor.clone()).definition(),
            GetObjectNamespaceList::new(executor.clone()).definition(),
            GetNonrunningPods::new(executor.clone()).definition(),
            GetObjectDetails::new(executor.clone()).definition(),
            GetPodList::new(executor.clone()).definition(),
            GetPodStatus::new(executor).definition(),
        ];
        assert_eq!(
            defs[4].function.parameters["required"],
            serde_json::json!(["namespace", "kind", "name"])
        );
        assert!(defs[3].function.description.contains("Disambiguation"));
    }
}
