//! Object health via `kube-health`.
//!
//! `kube-health` prints a header plus one line per evaluated condition. When
//! the object does not exist it prints at most one line, so anything shorter
//! than [`MIN_HEALTH_LINES`] is reported as [`AgentError::ObjectNotFound`]
//! instead of being passed through.

use super::cluster::validate_object_ref;
use kubeagent::ToolDef;
use kubeagent::error::AgentError;
use kubeagent::exec::{CommandExecutor, CommandSpec, ExecutionResult};
use kubeagent::tools::core::{Tool, ToolContext, ToolFuture, ToolOutput, parse_tool_args};
use kubeagent::tools::spec::{ParamType, ToolSpec};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub const KUBE_HEALTH: &str = "kube-health";

/// Fewer stdout lines than this means the object was not found.
pub const MIN_HEALTH_LINES: usize = 2;

#[derive(Deserialize)]
struct HealthArgs {
    kind: String,
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

/// Describe the health of one object.
pub struct GetObjectHealth {
    executor: Arc<CommandExecutor>,
}

impl GetObjectHealth {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }

    fn command(kind: &str, name: &str, namespace: Option<&str>) -> CommandSpec {
        let mut args = Vec::with_capacity(4);
        if let Some(ns) = namespace {
            args.push("-n".to_string());
            args.push(ns.to_string());
        }
        args.push("-H".to_string());
        args.push(format!("{kind}/{name}"));
        CommandSpec::argv(KUBE_HEALTH, args)
    }
}

/// Apply the line-count rule to a `kube-health` result.
pub fn health_output(object: &str, result: &ExecutionResult) -> ToolOutput {
    if result.line_count() < MIN_HEALTH_LINES {
        return Err(AgentError::ObjectNotFound {
            object: object.to_string(),
        });
    }
    Ok(result.to_tool_text())
}

impl Tool for GetObjectHealth {
    fn definition(&self) -> ToolDef {
        ToolSpec::builder(super::GET_OBJECT_HEALTH)
            .purpose("Describe the health of {kind} {name}")
            .when_to_use(
                "You need a health verdict for one individual object. Run it once per object; \
                 it does not accept 'all' as a name",
            )
            .when_not_to_use("You need the object's full definition; use get_object_details")
            .param("kind", ParamType::String, "The type of object, e.g. node or deployment")
            .param("name", ParamType::String, "The name of the object")
            .optional_param(
                "namespace",
                ParamType::String,
                "The namespace where the object is. Omit for cluster-scoped objects",
            )
            .example(
                r#"get_object_health(kind="node", name="worker-0")"#,
                "OBJECT        CONDITION   STATUS\nnode/worker-0 Ready       True",
            )
            .output_format("kube-health report, or an error when the object does not exist")
            .to_tool_def()
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async move {
            let tool = super::GET_OBJECT_HEALTH;
            let args: HealthArgs = parse_tool_args(tool, arguments)?;
            let namespace = args
                .namespace
                .as_deref()
                .map(str::trim)
                .filter(|ns| !ns.is_empty());

            validate_object_ref(tool, "kind", &args.kind)?;
            validate_object_ref(tool, "name", &args.name)?;
            if let Some(ns) = namespace {
                validate_object_ref(tool, "namespace", ns)?;
            }

            info!(
                "get_object_health: {} {}/{}",
                namespace.unwrap_or("<cluster>"),
                args.kind,
                args.name
            );
            let object = format!("{}/{}", args.kind, args.name);
            let result = self
                .executor
                .execute(&Self::command(&args.kind, &args.name, namespace))
                .await?;
            health_output(&object, &result)
        })
    }
}
