use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use upcraft_core::ActionResult;

/// Input handed to every handler: a JSON object, never null.
pub type ActionInput = serde_json::Map<String, serde_json::Value>;

/// Schema used when a contract is registered without one.
pub fn default_input_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

/// A handler's own failure, e.g. an upstream API error.
///
/// The source is kept so the registry can copy its whole chain into the
/// failed result.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HandlerError {
    /// Creates an error with no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping `source`.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Executable code bound to one action contract.
///
/// Handlers run on the dispatching task and may be invoked concurrently, so
/// any shared device or connection they touch needs its own serialization.
/// Blocking I/O must observe `cancel`.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Runs the action.
    async fn call(
        &self,
        input: ActionInput,
        cancel: CancellationToken,
    ) -> Result<ActionResult, HandlerError>;
}

/// Adapts an async closure into an [`ActionHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(ActionInput, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ActionResult, HandlerError>> + Send + 'static,
{
    async fn call(
        &self,
        input: ActionInput,
        cancel: CancellationToken,
    ) -> Result<ActionResult, HandlerError> {
        (self.0)(input, cancel).await
    }
}

/// Wraps an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ActionHandler>
where
    F: Fn(ActionInput, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ActionResult, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Case-insensitive registry key: `lower(trim(skill)).lower(trim(action))`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionKey {
    skill: String,
    action: String,
}

impl ActionKey {
    /// Normalizes a skill/action pair into a key.
    pub fn new(skill: &str, action: &str) -> Self {
        Self {
            skill: skill.trim().to_lowercase(),
            action: action.trim().to_lowercase(),
        }
    }

    /// The normalized skill part.
    pub fn skill(&self) -> &str {
        &self.skill
    }

    /// The normalized action part.
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.skill, self.action)
    }
}

/// What a capability provider hands to the registry.
///
/// Every field is optional at this stage; the registry validates it and turns
/// it into an immutable [`ActionContract`].
#[derive(Clone)]
pub struct ActionSpec {
    pub(crate) skill: String,
    pub(crate) action: String,
    pub(crate) description: String,
    pub(crate) input_schema: Option<serde_json::Value>,
    pub(crate) handler: Option<Arc<dyn ActionHandler>>,
}

impl ActionSpec {
    /// Starts a spec for `skill.action`.
    pub fn new(skill: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            action: action.into(),
            description: String::new(),
            input_schema: None,
            handler: None,
        }
    }

    /// Sets the human description shown to the model.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the JSON schema of the input object.
    pub fn input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Binds the handler.
    pub fn handler(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Binds an async closure as the handler.
    pub fn handler_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(ActionInput, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult, HandlerError>> + Send + 'static,
    {
        self.handler(handler_fn(f))
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("skill", &self.skill)
            .field("action", &self.action)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// An immutable, registered capability.
pub struct ActionContract {
    key: ActionKey,
    skill: String,
    action: String,
    description: String,
    input_schema: serde_json::Value,
    handler: Arc<dyn ActionHandler>,
}

impl ActionContract {
    pub(crate) fn new(
        key: ActionKey,
        skill: String,
        action: String,
        description: String,
        input_schema: serde_json::Value,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        Self {
            key,
            skill,
            action,
            description,
            input_schema,
            handler,
        }
    }

    /// Registry key.
    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    /// Skill name as registered (trimmed, original case).
    pub fn skill(&self) -> &str {
        &self.skill
    }

    /// Action name as registered (trimmed, original case).
    pub fn action(&self) -> &str {
        &self.action
    }

    /// `skill.action` in registered case, used as the tool function name.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.skill, self.action)
    }

    /// Human description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Input schema, defaulted when the provider supplied none.
    pub fn input_schema(&self) -> &serde_json::Value {
        &self.input_schema
    }

    pub(crate) fn handler(&self) -> &Arc<dyn ActionHandler> {
        &self.handler
    }
}

impl fmt::Debug for ActionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContract")
            .field("key", &self.key)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_key_is_case_and_whitespace_insensitive() {
        assert_eq!(ActionKey::new(" Music ", "PLAY"), ActionKey::new("music", "play"));
        assert_eq!(ActionKey::new("Music", "Play").to_string(), "music.play");
    }

    #[test]
    fn test_handler_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "device busy");
        let err = HandlerError::with_source("playback failed", io);
        assert_eq!(err.to_string(), "playback failed");
        assert_eq!(err.source().unwrap().to_string(), "device busy");
        assert!(HandlerError::new("plain").source().is_none());
    }

    #[tokio::test]
    async fn test_fn_handler_runs_closure() {
        let handler = handler_fn(|input: ActionInput, _cancel| async move {
            let query = input.get("query").and_then(|v| v.as_str()).unwrap_or("");
            Ok(ActionResult::success(format!("playing {query}")))
        });
        let mut input = ActionInput::new();
        input.insert("query".into(), serde_json::json!("jazz"));

        let result = handler.call(input, CancellationToken::new()).await.unwrap();
        assert_eq!(result.message, "playing jazz");
    }

    #[test]
    fn test_spec_debug_hides_handler() {
        let spec = ActionSpec::new("music", "pause").description("Pause playback");
        let dbg = format!("{spec:?}");
        assert!(dbg.contains("has_handler: false"));
    }
}
