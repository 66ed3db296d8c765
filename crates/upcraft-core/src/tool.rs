use serde::{Deserialize, Serialize};

/// A provider-neutral request from the LLM to invoke one action.
///
/// `name` has the form `skill.action`. `arguments` is either a JSON-encoded
/// string (OpenAI wire form) or an already structured object; the translator
/// in `upcraft-agent` accepts both.
///
/// Deserialization accepts the flat form `{id, name, arguments}` as well as
/// the nested wire form `{id, type: "function", function: {name, arguments}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawToolCall")]
pub struct ToolCall {
    /// Unique identifier assigned by the provider for this call.
    pub id: String,
    /// Function name, `skill.action`.
    pub name: String,
    /// Arguments to pass to the action.
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Creates a tool call with structured arguments.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Deserialize)]
struct RawToolCall {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<serde_json::Value>,
    #[serde(default)]
    function: Option<RawFunctionCall>,
}

#[derive(Deserialize)]
struct RawFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

impl From<RawToolCall> for ToolCall {
    fn from(raw: RawToolCall) -> Self {
        match raw.function {
            Some(function) => Self {
                id: raw.id,
                name: function.name,
                arguments: function.arguments,
            },
            None => Self {
                id: raw.id,
                name: raw.name.unwrap_or_default(),
                arguments: raw.arguments.unwrap_or(serde_json::Value::Null),
            },
        }
    }
}

/// OpenAI-style function tool, the exact shape a tool-calling provider consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The callable function.
    pub function: ToolFunctionDefinition,
}

/// Describes one callable function inside a [`ToolDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunctionDefinition {
    /// `skill.action`.
    pub name: String,
    /// Human description shown to the model.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Creates a `"function"` tool definition.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            kind: "function".to_string(),
            function: ToolFunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_tool_call() {
        let call: ToolCall = serde_json::from_value(serde_json::json!({
            "id": "call_1",
            "name": "music.play",
            "arguments": {"query": "jazz"}
        }))
        .unwrap();
        assert_eq!(call.name, "music.play");
        assert_eq!(call.arguments["query"], "jazz");
    }

    #[test]
    fn test_wire_tool_call() {
        let call: ToolCall = serde_json::from_value(serde_json::json!({
            "id": "call_2",
            "type": "function",
            "function": {"name": "browser.visit", "arguments": "{\"url\":\"https://x.dev\"}"}
        }))
        .unwrap();
        assert_eq!(call.id, "call_2");
        assert_eq!(call.name, "browser.visit");
        assert!(call.arguments.is_string());
    }

    #[test]
    fn test_missing_arguments_default_to_null() {
        let call: ToolCall =
            serde_json::from_value(serde_json::json!({"id": "c", "name": "music.pause"})).unwrap();
        assert!(call.arguments.is_null());
    }

    #[test]
    fn test_tool_definition_wire_shape() {
        let def = ToolDefinition::function("music.play", "Play a track", serde_json::json!({}));
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "music.play");
        assert_eq!(json["function"]["parameters"], serde_json::json!({}));
    }
}
