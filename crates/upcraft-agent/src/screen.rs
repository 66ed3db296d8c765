//! Deterministic screen resolution.
//!
//! Turns a UI node tree reported by a mobile or desktop shell into an action
//! intent without a model round-trip. Rules run in the order they were added
//! and the first one that matches decides the intent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use upcraft_skills::{ActionInput, DispatchRequest};

/// Why resolution produced no action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    /// The payload was empty or whitespace.
    EmptyInput,
    /// The payload was not JSON, or not a tree of objects and arrays.
    InvalidInput,
    /// The tree was well formed but no rule matched.
    NoTarget,
}

/// Resolver output. Serializes as `{"action":"CLICK","text":..}` or
/// `{"action":"NOOP","reason":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
pub enum ScreenIntent {
    /// Click the element labelled `text`.
    Click {
        /// Label to click.
        text: String,
    },
    /// Do nothing.
    Noop {
        /// Why nothing matched.
        reason: NoopReason,
    },
}

impl ScreenIntent {
    pub fn noop(reason: NoopReason) -> Self {
        Self::Noop { reason }
    }

    /// The request a CLICK dispatches to `skill.action`; `None` for NOOP.
    pub fn to_request(&self, skill: &str, action: &str) -> Option<DispatchRequest> {
        match self {
            Self::Click { text } => {
                let mut input = ActionInput::new();
                input.insert("text".to_string(), Value::String(text.clone()));
                Some(DispatchRequest::new(skill, action).with_input(input))
            }
            Self::Noop { .. } => None,
        }
    }

    /// Wire form handed back to the UI shell.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"action":"NOOP","reason":"invalid_input"}"#.to_string()
        })
    }
}

/// A predicate over the screen tree that yields an intent when it matches.
pub trait ScreenRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn evaluate(&self, tree: &Value) -> Option<ScreenIntent>;
}

/// Clicks the node whose `text` equals `label`, ignoring case and
/// surrounding whitespace.
#[derive(Debug, Clone)]
pub struct LabelClickRule {
    label: String,
    folded: String,
}

impl LabelClickRule {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into().trim().to_string();
        Self {
            folded: label.to_lowercase(),
            label,
        }
    }
}

impl ScreenRule for LabelClickRule {
    fn name(&self) -> &str {
        "label_click"
    }

    fn evaluate(&self, tree: &Value) -> Option<ScreenIntent> {
        find_node_text(tree, &|text| text.trim().to_lowercase() == self.folded).map(|_| {
            ScreenIntent::Click {
                text: self.label.clone(),
            }
        })
    }
}

/// Depth-first search for a `text` attribute (key matched case-insensitively)
/// whose string value satisfies `pred`.
pub fn find_node_text<'a>(tree: &'a Value, pred: &dyn Fn(&str) -> bool) -> Option<&'a str> {
    match tree {
        Value::Object(map) => {
            for (key, value) in map {
                if key.eq_ignore_ascii_case("text") {
                    if let Some(text) = value.as_str().filter(|t| pred(t)) {
                        return Some(text);
                    }
                }
                if let Some(found) = find_node_text(value, pred) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(|item| find_node_text(item, pred)),
        _ => None,
    }
}

/// Ordered list of screen rules.
#[derive(Clone, Default)]
pub struct ScreenResolver {
    rules: Vec<Arc<dyn ScreenRule>>,
}

impl ScreenResolver {
    /// A resolver with no rules: every well-formed tree resolves to `no_target`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver with only the built-in [`LabelClickRule`].
    pub fn with_label(label: impl Into<String>) -> Self {
        Self::new().rule(LabelClickRule::new(label))
    }

    /// Appends a rule; it runs after every rule added before it.
    pub fn rule(mut self, rule: impl ScreenRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Resolves a raw payload. Never fails.
    pub fn resolve_str(&self, raw: &str) -> ScreenIntent {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ScreenIntent::noop(NoopReason::EmptyInput);
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(tree) => self.resolve(&tree),
            Err(_) => ScreenIntent::noop(NoopReason::InvalidInput),
        }
    }

    /// Resolves a parsed tree. Only objects and arrays are trees; `null` is
    /// treated as empty input and any other scalar as invalid.
    pub fn resolve(&self, tree: &Value) -> ScreenIntent {
        match tree {
            Value::Null => ScreenIntent::noop(NoopReason::EmptyInput),
            Value::Object(_) | Value::Array(_) => {
                for rule in &self.rules {
                    if let Some(intent) = rule.evaluate(tree) {
                        tracing::debug!(rule = rule.name(), "Screen rule matched");
                        return intent;
                    }
                }
                ScreenIntent::noop(NoopReason::NoTarget)
            }
            _ => ScreenIntent::noop(NoopReason::InvalidInput),
        }
    }
}
