//! Structured reflection on tool failures.
//!
//! When a tool invocation fails, the [`AgentError`] is rendered into text
//! that the reasoning engine can act on: the error itself, a recovery hint
//! chosen from the error kind, and the arguments that were used.

use crate::error::AgentError;

/// Format a tool failure for the reasoning engine.
///
/// The first line is always `Error: <message>` so callers and tests can key
/// off the prefix.
pub fn format_tool_failure(tool_name: &str, arguments: &str, error: &AgentError) -> String {
    let mut msg = error.to_tool_text();

    let suggestions = recovery_hints(tool_name, error);
    if !suggestions.is_empty() {
        msg.push_str("\n\nRecovery:\n");
        for suggestion in &suggestions {
            msg.push_str(&format!("  - {suggestion}\n"));
        }
    }

    let args_preview: String = arguments.chars().take(200).collect();
    msg.push_str(&format!("\nArguments used: {args_preview}"));
    if arguments.chars().count() > 200 {
        msg.push_str("...");
    }

    msg
}

fn recovery_hints(tool_name: &str, error: &AgentError) -> Vec<String> {
    match error {
        AgentError::CommandUnavailable { program, .. } => vec![
            format!("'{program}' is not installed where the assistant runs. Do not retry {tool_name}."),
            "Tell the user this data source is unavailable.".into(),
        ],
        AgentError::Timeout { .. } => vec![
            "The cluster did not answer in time. Retry once with narrower arguments.".into(),
            "If it times out again, report that the data is currently unavailable.".into(),
        ],
        AgentError::UnknownTool { .. } => {
            vec!["Call one of the available tools listed in the error.".into()]
        }
        AgentError::InvalidArguments { .. } => vec![
            "Check that the arguments are valid JSON with the declared field names and types."
                .into(),
        ],
        AgentError::ObjectNotFound { .. } => vec![
            "Check the kind, name and namespace for typos.".into(),
            "List the objects first to confirm the exact name.".into(),
        ],
        AgentError::UpstreamServiceError { service, .. } => {
            vec![format!("Continue without {service} data.")]
        }
        AgentError::InconclusiveAnalysis { .. } => {
            vec!["Report the partial findings and say the analysis was inconclusive.".into()]
        }
        AgentError::ExecutionFailed { .. } | AgentError::Engine(_) => {
            vec!["Report the failure to the user instead of guessing.".into()]
        }
        AgentError::OutOfDomainQuery(_) | AgentError::Cancelled => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn format_failure_starts_with_error_prefix() {
        let err = AgentError::CommandUnavailable {
            program: "oc".into(),
            searched: "PATH".into(),
        };
        let result = format_tool_failure("get_namespaces", "{}", &err);
        assert!(result.starts_with("Error: command not found: 'oc'"));
        assert!(result.contains("Do not retry get_namespaces"));
        assert!(result.ends_with("Arguments used: {}"));
    }

    #[test]
    fn format_failure_suggests_listing_on_not_found() {
        let err = AgentError::ObjectNotFound {
            object: "deployment/web".into(),
        };
        let result = format_tool_failure(
            "get_object_health",
            r#"{"kind":"deployment","name":"web"}"#,
            &err,
        );
        assert!(result.contains("List the objects first"));
        assert!(result.contains(r#""name":"web""#));
    }

    #[test]
    fn format_failure_truncates_long_arguments() {
        let err = AgentError::Timeout {
            operation: "oc".into(),
            after: Duration::from_secs(2),
        };
        let args = "x".repeat(500);
        let result = format_tool_failure("get_pod_list", &args, &err);
        assert!(result.ends_with("..."));
        assert!(!result.contains(&"x".repeat(201)));
    }
}
