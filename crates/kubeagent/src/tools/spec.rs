//! Statically declared tool descriptions.
//!
//! A [`ToolSpec`] names a tool, documents when to use it, and declares its
//! parameters as an ordered list of [`ParamSpec`]s. The JSON Schema sent to
//! the reasoning engine and used for argument validation is generated from
//! that list, so the two can never diverge.
//!
//! Descriptions may reference a parameter as `{name}`. Every such reference
//! must be a declared parameter; [`ToolSpecBuilder::build`] panics otherwise,
//! which surfaces the mistake at registration time.

use crate::ToolDef;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn json_type(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
}

/// A usage example for a tool.
#[derive(Debug, Clone)]
pub struct UsageExample {
    /// Description of the input/scenario.
    pub input: String,
    /// Expected behavior or output.
    pub output: String,
}

/// An example clarifying when to use this tool vs a similar one.
#[derive(Debug, Clone)]
pub struct DisambiguationExample {
    pub scenario: String,
    pub correct_tool: String,
    pub reason: String,
}

/// A structured tool specification.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name (unique within a ToolSet).
    pub name: String,
    /// One-sentence imperative purpose.
    pub purpose: String,
    pub when_to_use: String,
    /// Prevents confusion with similar tools.
    pub when_not_to_use: String,
    /// Declared parameters, in order.
    pub params: Vec<ParamSpec>,
    pub examples: Vec<UsageExample>,
    pub output_format: String,
    pub disambiguation: Vec<DisambiguationExample>,
}

impl ToolSpec {
    /// Create a new ToolSpec builder.
    pub fn builder(name: impl Into<String>) -> ToolSpecBuilder {
        ToolSpecBuilder {
            name: name.into(),
            purpose: None,
            when_to_use: None,
            when_not_to_use: None,
            params: Vec::new(),
            examples: Vec::new(),
            output_format: None,
            disambiguation: Vec::new(),
        }
    }

    /// Names of the required parameters, in declaration order.
    pub fn required_params(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// JSON Schema for the parameter object.
    pub fn json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.params {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type.json_type(),
                    "description": param.description,
                }),
            );
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_params(),
        })
    }

    /// Convert this spec to a rich description string for the engine.
    pub fn to_description(&self) -> String {
        let mut desc = format!("{}.", self.purpose);
        desc.push_str(&format!("\nWhen to use: {}", self.when_to_use));
        desc.push_str(&format!("\nWhen NOT to use: {}", self.when_not_to_use));

        if !self.examples.is_empty() {
            desc.push_str("\nExamples:");
            for ex in &self.examples {
                desc.push_str(&format!("\n  - Input: {} → {}", ex.input, ex.output));
            }
        }

        if !self.output_format.is_empty() {
            desc.push_str(&format!("\nOutput format: {}", self.output_format));
        }

        if !self.disambiguation.is_empty() {
            desc.push_str("\nDisambiguation:");
            for d in &self.disambiguation {
                desc.push_str(&format!(
                    "\n  - {}: use '{}' instead, {}",
                    d.scenario, d.correct_tool, d.reason
                ));
            }
        }

        desc
    }

    /// Convert to the `ToolDef` sent to the engine.
    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef::new(self.name.clone(), self.to_description(), self.json_schema())
    }

    /// Every `{param}` placeholder referenced in the descriptive fields.
    fn referenced_params(&self) -> Vec<String> {
        let mut texts: Vec<&str> = vec![
            &self.purpose,
            &self.when_to_use,
            &self.when_not_to_use,
            &self.output_format,
        ];
        for ex in &self.examples {
            texts.push(&ex.input);
            texts.push(&ex.output);
        }
        texts.into_iter().flat_map(placeholders).collect()
    }
}

/// Identifiers written as `{ident}` in `text`.
fn placeholders(text: &str) -> Vec<String> {
    text.split('{')
        .skip(1)
        .filter_map(|segment| segment.split_once('}').map(|(inner, _)| inner))
        .filter(|inner| {
            let mut chars = inner.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
        .map(str::to_string)
        .collect()
}

/// Builder for constructing a `ToolSpec`. Panics on `build()` if required
/// fields are missing or a description references an undeclared parameter.
pub struct ToolSpecBuilder {
    name: String,
    purpose: Option<String>,
    when_to_use: Option<String>,
    when_not_to_use: Option<String>,
    params: Vec<ParamSpec>,
    examples: Vec<UsageExample>,
    output_format: Option<String>,
    disambiguation: Vec<DisambiguationExample>,
}

impl ToolSpecBuilder {
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn when_to_use(mut self, when: impl Into<String>) -> Self {
        self.when_to_use = Some(when.into());
        self
    }

    pub fn when_not_to_use(mut self, when_not: impl Into<String>) -> Self {
        self.when_not_to_use = Some(when_not.into());
        self
    }

    /// Declare a required parameter.
    pub fn param(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
        });
        self
    }

    /// Declare an optional parameter.
    pub fn optional_param(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            param_type,
            required: false,
            description: description.into(),
        });
        self
    }

    pub fn example(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.examples.push(UsageExample {
            input: input.into(),
            output: output.into(),
        });
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    pub fn disambiguate(
        mut self,
        scenario: impl Into<String>,
        correct_tool: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.disambiguation.push(DisambiguationExample {
            scenario: scenario.into(),
            correct_tool: correct_tool.into(),
            reason: reason.into(),
        });
        self
    }

    /// Build and convert to a [`ToolDef`] in one step.
    pub fn to_tool_def(self) -> ToolDef {
        self.build().to_tool_def()
    }

    /// Build the `ToolSpec`, reporting the first problem as an error.
    pub fn try_build(self) -> Result<ToolSpec, String> {
        let name = self.name;
        let missing = |field: &str| format!("ToolSpec '{name}' requires '{field}'");
        let spec = ToolSpec {
            purpose: self.purpose.ok_or_else(|| missing("purpose"))?,
            when_to_use: self.when_to_use.ok_or_else(|| missing("when_to_use"))?,
            when_not_to_use: self
                .when_not_to_use
                .ok_or_else(|| missing("when_not_to_use"))?,
            params: self.params,
            examples: self.examples,
            output_format: self.output_format.unwrap_or_else(|| "Plain text".into()),
            disambiguation: self.disambiguation,
            name: name.clone(),
        };

        for (i, param) in spec.params.iter().enumerate() {
            if spec.params[..i].iter().any(|p| p.name == param.name) {
                return Err(format!(
                    "ToolSpec '{name}' declares parameter '{}' twice",
                    param.name
                ));
            }
        }

        if let Some(undeclared) = spec
            .referenced_params()
            .into_iter()
            .find(|r| !spec.params.iter().any(|p| &p.name == r))
        {
            return Err(format!(
                "ToolSpec '{name}' references undeclared parameter '{undeclared}'"
            ));
        }

        Ok(spec)
    }

    /// Build the `ToolSpec`. Panics on an incomplete or inconsistent spec.
    pub fn build(self) -> ToolSpec {
        self.try_build().unwrap_or_else(|e| panic!("{e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_spec() -> ToolSpecBuilder {
        ToolSpec::builder("get_object_namespace_list")
            .purpose("List objects of kind {kind} in namespace {namespace}")
            .when_to_use("When the user asks what exists inside one namespace")
            .when_not_to_use("When the namespace is unknown, use the cluster-wide list instead")
            .param("kind", ParamType::String, "Object kind, e.g. pod")
            .param("namespace", ParamType::String, "Namespace to list")
    }

    #[test]
    fn build_tool_spec() {
        let spec = list_spec()
            .example(
                r#"get_object_namespace_list(kind="pod", namespace="default")"#,
                "pod/web-1",
            )
            .output_format("One kind/name per line")
            .build();

        assert_eq!(spec.name, "get_object_namespace_list");
        assert_eq!(spec.required_params(), vec!["kind", "namespace"]);
        let desc = spec.to_description();
        assert!(desc.contains("When NOT to use:"));
        assert!(desc.contains("One kind/name per line"));
    }

    #[test]
    fn schema_is_generated_from_params() {
        let def = ToolSpec::builder("get_object_health")
            .purpose("Health-check one {kind}/{name} object")
            .when_to_use("When asked whether an object is healthy")
            .when_not_to_use("When you need the full object, use get_object_details")
            .param("kind", ParamType::String, "Object kind")
            .param("name", ParamType::String, "Object name")
            .optional_param("namespace", ParamType::String, "Namespace, if namespaced")
            .to_tool_def();

        let schema = &def.function.parameters;
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["namespace"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["kind", "name"]));
    }

    #[test]
    fn placeholders_ignore_non_identifiers() {
        assert_eq!(
            placeholders("jsonpath='{.status}' for {pod} in {}"),
            vec!["pod".to_string()]
        );
    }

    #[test]
    fn try_build_rejects_undeclared_reference() {
        let err = ToolSpec::builder("get_pod_status")
            .purpose("Show the status of {pod}")
            .when_to_use("When asked about one pod")
            .when_not_to_use("For lists")
            .param("namespace", ParamType::String, "Namespace")
            .try_build()
            .unwrap_err();
        assert!(err.contains("undeclared parameter 'pod'"));
    }

    #[test]
    fn try_build_rejects_duplicate_params() {
        let err = list_spec()
            .param("kind", ParamType::String, "again")
            .try_build()
            .unwrap_err();
        assert!(err.contains("declares parameter 'kind' twice"));
    }

    #[test]
    #[should_panic(expected = "ToolSpec 'incomplete' requires 'purpose'")]
    fn builder_panics_on_missing_purpose() {
        ToolSpec::builder("incomplete")
            .when_to_use("test")
            .when_not_to_use("test")
            .build();
    }
}
