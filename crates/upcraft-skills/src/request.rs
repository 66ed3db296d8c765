use crate::contract::ActionInput;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One request to run `skill.action`.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Skill name, matched case-insensitively.
    pub skill: String,
    /// Action name, matched case-insensitively.
    pub action: String,
    /// Handler input; empty when the caller supplied none.
    pub input: ActionInput,
    /// Cancelling this token aborts the dispatch with a `cancelled` result.
    pub cancel: CancellationToken,
    /// When set, the dispatch resolves to a `timeout` result after this long.
    pub deadline: Option<Duration>,
}

impl DispatchRequest {
    /// Creates a request with empty input, a fresh token and no deadline.
    pub fn new(skill: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            action: action.into(),
            input: ActionInput::new(),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Sets the input. `None` keeps the empty mapping.
    pub fn with_input(mut self, input: impl Into<Option<ActionInput>>) -> Self {
        self.input = input.into().unwrap_or_default();
        self
    }

    /// Links the dispatch to a caller-owned token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Bounds the dispatch by a deadline.
    pub fn with_deadline(mut self, deadline: impl Into<Option<Duration>>) -> Self {
        self.deadline = deadline.into();
        self
    }

    /// `skill.action` as requested.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.skill, self.action)
    }
}
