use serde_json::{json, Value};
use tracing::info;
use upcraft_core::ActionResult;
use upcraft_skills::{ActionInput, ActionRegistry, ActionSpec, HandlerError, RegistrationError};

/// Registers the actions the CLI can run without a device attached.
pub fn register_local_actions(registry: &ActionRegistry) -> Result<usize, RegistrationError> {
    registry.describe_skill("system", "Local diagnostics");
    registry.describe_skill("screen", "UI automation on the active screen");

    registry.register_all(vec![
        ActionSpec::new("system", "echo")
            .description("Echo the input back as the result payload")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to echo"}
                }
            }))
            .handler_fn(|input, _cancel| async move { Ok(echo(input)) }),
        ActionSpec::new("screen", "click")
            .description("Click the on-screen element with the given label")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Visible label to click"}
                },
                "required": ["text"]
            }))
            .handler_fn(|input, _cancel| async move { click(input) }),
    ])
}

fn echo(input: ActionInput) -> ActionResult {
    let message = match input.get("text").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => "echo".to_string(),
    };
    ActionResult::with_data(message, Value::Object(input))
}

fn click(input: ActionInput) -> Result<ActionResult, HandlerError> {
    let text = input
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HandlerError::new("field 'text' is required"))?;

    // No device bridge in the CLI: the click is logged and reported.
    info!(target_label = %text, "Screen click");
    Ok(ActionResult::with_data(
        format!("clicked {text}"),
        json!({ "text": text }),
    ))
}
