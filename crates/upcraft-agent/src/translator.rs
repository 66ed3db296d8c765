use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use upcraft_core::{ActionErrorKind, ActionResult, Message, ToolCall};
use upcraft_skills::{ActionInput, ActionRegistry, DispatchRequest};

/// Bridges provider tool calls and the registry's dispatch contract.
#[derive(Clone)]
pub struct ToolCallTranslator {
    registry: Arc<ActionRegistry>,
}

impl ToolCallTranslator {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatches `call` and returns its result.
    ///
    /// Malformed names and undecodable arguments come back as failed results,
    /// exactly like failures inside the registry.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        cancel: CancellationToken,
        deadline: Option<Duration>,
    ) -> ActionResult {
        let request = match to_request(call) {
            Ok(request) => request.with_cancel(cancel).with_deadline(deadline),
            Err(failed) => return failed,
        };

        info!(call_id = %call.id, tool = %call.name, "Executing tool call");
        self.registry.execute(request).await
    }

    /// Dispatches `call` and wraps the result as the tool message answering it.
    pub async fn dispatch_to_message(
        &self,
        call: &ToolCall,
        cancel: CancellationToken,
        deadline: Option<Duration>,
    ) -> (ActionResult, Message) {
        let result = self.dispatch(call, cancel, deadline).await;
        let message = result_message(&call.id, &result);
        (result, message)
    }
}

/// Splits `call.name` on the first `.` and decodes its arguments.
pub fn to_request(call: &ToolCall) -> Result<DispatchRequest, ActionResult> {
    let (skill, action) = split_name(&call.name).ok_or_else(|| {
        ActionResult::error(
            ActionErrorKind::MalformedCall,
            format!("malformed tool call: {:?}", call.name),
            "expected a function name of the form skill.action",
        )
    })?;

    let input = decode_arguments(&call.arguments).map_err(|detail| {
        ActionResult::error(
            ActionErrorKind::InvalidArguments,
            format!("invalid arguments for {}", call.name),
            detail,
        )
    })?;

    Ok(DispatchRequest::new(skill, action).with_input(input))
}

fn split_name(name: &str) -> Option<(&str, &str)> {
    let (skill, action) = name.split_once('.')?;
    if skill.trim().is_empty() || action.trim().is_empty() {
        return None;
    }
    Some((skill, action))
}

/// Decodes tool-call arguments into handler input.
///
/// Accepts a structured object, a JSON-encoded object string, or nothing
/// (null or blank string), which decodes to an empty mapping.
pub fn decode_arguments(arguments: &serde_json::Value) -> Result<ActionInput, String> {
    match arguments {
        serde_json::Value::Null => Ok(ActionInput::new()),
        serde_json::Value::Object(map) => Ok(map.clone()),
        serde_json::Value::String(raw) if raw.trim().is_empty() => Ok(ActionInput::new()),
        serde_json::Value::String(raw) => match serde_json::from_str(raw) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(serde_json::Value::Null) => Ok(ActionInput::new()),
            Ok(other) => Err(format!("arguments must be a JSON object, got {}", type_name(&other))),
            Err(e) => Err(format!("arguments are not valid JSON: {e}")),
        },
        other => Err(format!("arguments must be a JSON object, got {}", type_name(other))),
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// The tool message carrying `result` back to the model.
pub fn result_message(call_id: &str, result: &ActionResult) -> Message {
    let content = serde_json::to_string(result).unwrap_or_else(|_| result.message.clone());
    let mut message = Message::tool(call_id, content);
    message
        .metadata
        .insert("success".to_string(), serde_json::Value::Bool(result.success));
    message
}
