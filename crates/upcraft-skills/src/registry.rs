use crate::contract::{default_input_schema, ActionContract, ActionKey, ActionSpec};
use crate::definition::{ActionDefinition, SkillDefinition, DEFAULT_SKILL_DESCRIPTION};
use crate::error::RegistrationError;
use crate::request::DispatchRequest;
use futures_util::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};
use upcraft_core::{ActionError, ActionErrorKind, ActionResult, ToolDefinition};

/// Central registry binding `(skill, action)` keys to contracts.
///
/// Built once by the composition root and shared by `Arc`. Registration takes
/// the write lock; dispatch and both exports take the read lock. The lock only
/// guards the map: handlers run after it has been released.
pub struct ActionRegistry {
    actions: RwLock<BTreeMap<ActionKey, Arc<ActionContract>>>,
    skill_descriptions: RwLock<HashMap<String, String>>,
    /// Normalized skill name to the spelling it was first registered with.
    skill_names: RwLock<HashMap<String, String>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: RwLock::new(BTreeMap::new()),
            skill_descriptions: RwLock::new(HashMap::new()),
            skill_names: RwLock::new(HashMap::new()),
        }
    }

    /// Validates `spec` and stores it as an immutable contract.
    ///
    /// Fails without touching existing state on an empty identifier, a missing
    /// handler, or a key that is already taken.
    pub fn register(&self, spec: ActionSpec) -> Result<(), RegistrationError> {
        let ActionSpec {
            skill,
            action,
            description,
            input_schema,
            handler,
        } = spec;

        let skill_name = skill.trim();
        let action_name = action.trim();
        if skill_name.is_empty() || action_name.is_empty() {
            return Err(RegistrationError::MissingIdentifier { skill, action });
        }
        let Some(handler) = handler else {
            return Err(RegistrationError::MissingHandler(format!(
                "{skill_name}.{action_name}"
            )));
        };

        let key = ActionKey::new(skill_name, action_name);
        let contract = Arc::new(ActionContract::new(
            key.clone(),
            skill_name.to_string(),
            action_name.to_string(),
            description,
            input_schema.unwrap_or_else(default_input_schema),
            handler,
        ));

        let mut actions = self.actions.write();
        if actions.contains_key(&key) {
            return Err(RegistrationError::Duplicate(key.to_string()));
        }
        self.skill_names
            .write()
            .entry(key.skill().to_string())
            .or_insert_with(|| skill_name.to_string());
        actions.insert(key.clone(), contract);
        drop(actions);

        info!(action = %key, "Registered action");
        Ok(())
    }

    /// Registers every spec in order, stopping at the first failure.
    pub fn register_all(
        &self,
        specs: impl IntoIterator<Item = ActionSpec>,
    ) -> Result<usize, RegistrationError> {
        let mut count = 0;
        for spec in specs {
            self.register(spec)?;
            count += 1;
        }
        Ok(count)
    }

    /// Overrides the description exported for `skill` in [`Self::skill_definitions`].
    pub fn describe_skill(&self, skill: &str, description: impl Into<String>) {
        self.skill_descriptions
            .write()
            .insert(skill.trim().to_lowercase(), description.into());
    }

    pub fn get(&self, skill: &str, action: &str) -> Option<Arc<ActionContract>> {
        self.actions.read().get(&ActionKey::new(skill, action)).cloned()
    }

    pub fn contains(&self, skill: &str, action: &str) -> bool {
        self.actions.read().contains_key(&ActionKey::new(skill, action))
    }

    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }

    /// Dispatches one request. Never fails: every outcome is an [`ActionResult`].
    ///
    /// The handler is awaited on the calling task. Cancelling the request
    /// token yields a `cancelled` result, an expired deadline a `timeout`
    /// result; in both cases the handler future is dropped and the token it
    /// received is cancelled.
    pub async fn execute(&self, request: DispatchRequest) -> ActionResult {
        let requested = request.qualified_name();
        let DispatchRequest {
            skill,
            action,
            input,
            cancel,
            deadline,
        } = request;

        let Some(contract) = self.get(&skill, &action) else {
            warn!(action = %requested, "Dispatch to unknown action");
            return ActionResult::error(
                ActionErrorKind::UnknownAction,
                format!("unknown action: {requested}"),
                "action not registered",
            );
        };

        if cancel.is_cancelled() {
            return cancelled_result(&requested);
        }

        debug!(action = %requested, "Dispatching action");

        let handler_token = cancel.child_token();
        let call = AssertUnwindSafe(contract.handler().call(input, handler_token.clone()))
            .catch_unwind();
        let expiry = async move {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => cancelled_result(&requested),
            _ = expiry => {
                handler_token.cancel();
                timeout_result(&requested, deadline.unwrap_or_default())
            }
            outcome = call => normalize(&requested, outcome),
        };

        if !result.success {
            warn!(
                action = %requested,
                kind = ?result.error_kind(),
                message = %result.message,
                "Action dispatch failed"
            );
        }
        result
    }

    /// Tool definitions for a function-calling provider, sorted by key.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.actions
            .read()
            .values()
            .map(|c| {
                ToolDefinition::function(
                    c.qualified_name(),
                    c.description(),
                    c.input_schema().clone(),
                )
            })
            .collect()
    }

    /// Skill definitions for the sync service.
    ///
    /// Skills ascending by name, actions within a skill ascending by name,
    /// regardless of registration order. Skills that differ only in case form
    /// one group, named with the first spelling registered.
    pub fn skill_definitions(&self) -> Vec<SkillDefinition> {
        let mut by_skill: BTreeMap<String, Vec<ActionDefinition>> = BTreeMap::new();
        let actions = self.actions.read();
        for contract in actions.values() {
            by_skill
                .entry(contract.key().skill().to_string())
                .or_default()
                .push(ActionDefinition {
                    name: contract.action().to_string(),
                    description: contract.description().to_string(),
                    input_schema: contract.input_schema().to_string(),
                });
        }

        let names = self.skill_names.read();
        let descriptions = self.skill_descriptions.read();
        by_skill
            .into_iter()
            .map(|(skill, mut actions)| {
                actions.sort_by(|a, b| a.name.cmp(&b.name));
                let description = descriptions
                    .get(&skill)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_SKILL_DESCRIPTION.to_string());
                SkillDefinition {
                    name: names.get(&skill).cloned().unwrap_or(skill),
                    description,
                    actions,
                }
            })
            .collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(
    name: &str,
    outcome: Result<Result<ActionResult, crate::contract::HandlerError>, Box<dyn Any + Send>>,
) -> ActionResult {
    match outcome {
        Ok(Ok(result)) if result.is_empty() => ActionResult::error(
            ActionErrorKind::ContractViolation,
            format!("action returned empty result: {name}"),
            "handler contract violation",
        ),
        Ok(Ok(result)) if result.success && result.error.is_some() => ActionResult::error(
            ActionErrorKind::ContractViolation,
            format!("action returned success with an error: {name}"),
            "handler contract violation",
        ),
        Ok(Ok(mut result)) => {
            if !result.success && result.error.is_none() {
                result.error = Some(ActionError::new(ActionErrorKind::Handler, result.message.clone()));
            }
            result
        }
        Ok(Err(err)) => ActionResult::failure(
            format!("action failed: {name}: {err}"),
            ActionError::from_error(ActionErrorKind::Handler, &err),
        ),
        Err(panic) => ActionResult::error(
            ActionErrorKind::Panicked,
            format!("action panicked: {name}"),
            panic_message(panic.as_ref()),
        ),
    }
}

fn cancelled_result(name: &str) -> ActionResult {
    ActionResult::error(
        ActionErrorKind::Cancelled,
        format!("action cancelled: {name}"),
        "dispatch cancelled before completion",
    )
}

fn timeout_result(name: &str, deadline: std::time::Duration) -> ActionResult {
    ActionResult::error(
        ActionErrorKind::Timeout,
        format!("action timed out: {name}"),
        format!("no result within {}ms", deadline.as_millis()),
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
