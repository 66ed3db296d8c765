use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a dispatch failed.
///
/// `Cancelled` and `Timeout` are kept apart from `Handler` so callers can tell
/// an aborted call from a business-logic failure and decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    /// No contract is registered under the requested `skill.action`.
    UnknownAction,
    /// A tool call whose name is not of the form `skill.action`.
    MalformedCall,
    /// Tool-call arguments that do not decode into an object.
    InvalidArguments,
    /// The handler returned an empty result.
    ContractViolation,
    /// The handler reported its own failure.
    Handler,
    /// The handler panicked.
    Panicked,
    /// The dispatch was cancelled by its caller.
    Cancelled,
    /// The dispatch deadline expired.
    Timeout,
}

impl ActionErrorKind {
    /// Returns `true` for kinds caused by the call being aborted rather than failing.
    pub fn is_interruption(self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout)
    }
}

impl fmt::Display for ActionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnknownAction => "unknown_action",
            Self::MalformedCall => "malformed_call",
            Self::InvalidArguments => "invalid_arguments",
            Self::ContractViolation => "contract_violation",
            Self::Handler => "handler",
            Self::Panicked => "panicked",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Structured error detail attached to a failed [`ActionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionError {
    /// Error category.
    pub kind: ActionErrorKind,
    /// Top-level error text.
    pub detail: String,
    /// Source chain of the original error, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ActionError {
    /// Creates an error detail without a cause chain.
    pub fn new(kind: ActionErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            causes: Vec::new(),
        }
    }

    /// Creates an error detail from a `std::error::Error`, flattening its sources.
    pub fn from_error(kind: ActionErrorKind, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind,
            detail: err.to_string(),
            causes,
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// The normalized outcome of exactly one dispatch.
///
/// Either a success result (`error` is `None`) or a failed result with a
/// populated `error`; the constructors are the only way the runtime builds one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action completed.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Optional structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error detail, present exactly when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl ActionResult {
    /// Creates a successful result.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    /// Creates a successful result carrying a data payload.
    pub fn with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::success(message)
        }
    }

    /// Creates a failed result.
    pub fn failure(message: impl Into<String>, error: ActionError) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error),
        }
    }

    /// Creates a failed result whose detail has no cause chain.
    pub fn error(kind: ActionErrorKind, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::failure(message, ActionError::new(kind, detail))
    }

    /// Returns the error kind of a failed result.
    pub fn error_kind(&self) -> Option<ActionErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// A result that carries nothing: success without a message or data.
    ///
    /// The registry treats this as the handler breaking its contract.
    pub fn is_empty(&self) -> bool {
        self.success
            && self.message.trim().is_empty()
            && self.data.as_ref().map_or(true, serde_json::Value::is_null)
            && self.error.is_none()
    }
}
