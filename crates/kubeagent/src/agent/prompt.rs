//! Sectioned system prompt assembly.
//!
//! Every agent prompt has the same shape: a role preamble, a list of hard
//! rules, a catalogue of the tools the agent may call, and free-form
//! sections. [`SystemPromptBuilder`] keeps that shape consistent across
//! agents.

use crate::tools::core::ToolSet;

/// Builder for multi-section system prompts.
///
/// Sections are joined with blank lines. Empty sections are skipped.
///
/// ```
/// use kubeagent::agent::prompt::SystemPromptBuilder;
///
/// let prompt = SystemPromptBuilder::new("You inspect OpenShift clusters.")
///     .rules(["Never modify cluster state.", "Quote command output verbatim."])
///     .section("Output", "Return the tool output unchanged.")
///     .section("Namespace", "")
///     .build();
///
/// assert!(prompt.contains("## Rules\n\n- Never modify cluster state."));
/// assert!(prompt.contains("## Output"));
/// assert!(!prompt.contains("## Namespace"));
/// ```
#[derive(Debug, Clone)]
pub struct SystemPromptBuilder {
    sections: Vec<String>,
}

impl SystemPromptBuilder {
    /// Start with a preamble, included without a heading.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            sections: vec![preamble.into()],
        }
    }

    /// Append a `## heading` section. Skipped if `content` is empty.
    pub fn section(mut self, heading: &str, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.trim().is_empty() {
            self.sections.push(format!("## {heading}\n\n{content}"));
        }
        self
    }

    /// Append a bulleted "Rules" section.
    pub fn rules<I, S>(self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let body = bullets(rules);
        self.section("Rules", body)
    }

    /// Append an "Available tools" section listing each tool's name and
    /// the first line of its description.
    pub fn tools(self, tools: &ToolSet) -> Self {
        let body = bullets(tools.definitions().iter().map(|def| {
            let summary = def
                .function
                .description
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            format!("`{}`: {summary}", def.function.name)
        }));
        self.section("Available tools", body)
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

fn bullets<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
