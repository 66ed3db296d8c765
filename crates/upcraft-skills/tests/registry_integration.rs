#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the action registry.
//!
//! Covers: registration invariants, dispatch normalization, export ordering,
//! concurrency, and cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use upcraft_core::{ActionErrorKind, ActionResult};
use upcraft_skills::{
    ActionHandler, ActionInput, ActionRegistry, ActionSpec, DispatchRequest, HandlerError,
    RegistrationError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Echoes the `tag` input and counts invocations.
struct CountingHandler {
    calls: AtomicUsize,
    label: &'static str,
}

impl CountingHandler {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            label,
        })
    }
}

#[async_trait::async_trait]
impl ActionHandler for CountingHandler {
    async fn call(
        &self,
        input: ActionInput,
        _cancel: CancellationToken,
    ) -> Result<ActionResult, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ActionResult::with_data(
            self.label,
            serde_json::json!({ "tag": input.get("tag").cloned() }),
        ))
    }
}

/// Sleeps far longer than any test deadline.
fn sleeping_spec(skill: &str, action: &str) -> ActionSpec {
    ActionSpec::new(skill, action).handler_fn(|_, cancel: CancellationToken| async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(3600)) => Ok(ActionResult::success("woke up")),
            _ = cancel.cancelled() => Err(HandlerError::new("interrupted")),
        }
    })
}

fn input(pairs: &[(&str, serde_json::Value)]) -> ActionInput {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_key_is_rejected_and_first_contract_survives() {
    let registry = ActionRegistry::new();
    let first = CountingHandler::new("first");
    let second = CountingHandler::new("second");

    registry
        .register(ActionSpec::new("Music", "Play").description("original").handler(first.clone()))
        .unwrap();
    let err = registry
        .register(ActionSpec::new(" music ", "PLAY").description("impostor").handler(second.clone()))
        .unwrap_err();

    assert_eq!(err, RegistrationError::Duplicate("music.play".into()));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("music", "play").unwrap().description(), "original");

    let result = registry.execute(DispatchRequest::new("MUSIC", "play")).await;
    assert!(result.success);
    assert_eq!(result.message, "first");
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn register_all_stops_at_first_failure() {
    let registry = ActionRegistry::new();
    let handler = CountingHandler::new("ok");
    let err = registry
        .register_all(vec![
            ActionSpec::new("music", "play").handler(handler.clone()),
            ActionSpec::new("music", "pause"),
            ActionSpec::new("music", "next").handler(handler),
        ])
        .unwrap_err();

    assert_eq!(err, RegistrationError::MissingHandler("music.pause".into()));
    assert!(registry.contains("music", "play"));
    assert!(!registry.contains("music", "next"));
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_action_returns_failed_result_naming_it() {
    let registry = ActionRegistry::new();

    for req in [
        DispatchRequest::new("music", "rewind"),
        DispatchRequest::new("music", "rewind").with_input(None),
        DispatchRequest::new("music", "rewind").with_input(input(&[("x", 1.into())])),
    ] {
        let result = registry.execute(req).await;
        assert!(!result.success);
        assert_eq!(result.error_kind(), Some(ActionErrorKind::UnknownAction));
        assert!(result.message.contains("music.rewind"), "{}", result.message);
    }
}

#[tokio::test]
async fn empty_handler_result_is_a_contract_violation() {
    let registry = ActionRegistry::new();
    registry
        .register(
            ActionSpec::new("browser", "search")
                .handler_fn(|_, _| async { Ok(ActionResult::success("")) }),
        )
        .unwrap();

    let result = registry.execute(DispatchRequest::new("browser", "search")).await;
    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ActionErrorKind::ContractViolation));
    assert!(result.message.contains("browser.search"));
}

#[tokio::test]
async fn handler_receives_empty_input_when_none_given() {
    let registry = ActionRegistry::new();
    registry
        .register(ActionSpec::new("music", "resume").handler_fn(|input: ActionInput, _| async move {
            Ok(ActionResult::success(format!("{} keys", input.len())))
        }))
        .unwrap();

    let result = registry
        .execute(DispatchRequest::new("music", "resume").with_input(None))
        .await;
    assert_eq!(result.message, "0 keys");
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

#[test]
fn skill_definitions_are_sorted_regardless_of_registration_order() {
    let registry = ActionRegistry::new();
    let handler = CountingHandler::new("ok");
    for (skill, action) in [
        ("music", "resume"),
        ("music", "play"),
        ("music", "pause"),
        ("music", "next"),
        ("browser", "visit"),
        ("browser", "search"),
    ] {
        registry
            .register(ActionSpec::new(skill, action).handler(handler.clone()))
            .unwrap();
    }

    let defs = registry.skill_definitions();
    let skills: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(skills, vec!["browser", "music"]);

    let music: Vec<_> = defs[1].actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(music, vec!["next", "pause", "play", "resume"]);

    let schema: serde_json::Value = serde_json::from_str(&defs[0].actions[0].input_schema).unwrap();
    assert_eq!(schema["type"], "object");
}

#[test]
fn tool_definitions_use_skill_dot_action_names() {
    let registry = ActionRegistry::new();
    let schema = serde_json::json!({
        "type": "object",
        "properties": {"query": {"type": "string"}},
        "required": ["query"]
    });
    registry
        .register(
            ActionSpec::new("music", "play")
                .description("Play a song by query")
                .input_schema(schema.clone())
                .handler(CountingHandler::new("ok")),
        )
        .unwrap();
    registry
        .register(ActionSpec::new("browser", "visit").handler(CountingHandler::new("ok")))
        .unwrap();

    let defs = registry.tool_definitions();
    let names: Vec<_> = defs.iter().map(|d| d.function.name.as_str()).collect();
    assert_eq!(names, vec!["browser.visit", "music.play"]);
    assert_eq!(defs[1].kind, "function");
    assert_eq!(defs[1].function.description, "Play a song by query");
    assert_eq!(defs[1].function.parameters, schema);
    assert_eq!(defs, registry.tool_definitions());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_loses_no_updates() {
    let registry = Arc::new(ActionRegistry::new());
    let handler = CountingHandler::new("ok");

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let registry = registry.clone();
            let handler = handler.clone();
            tokio::spawn(async move {
                registry.register(ActionSpec::new(format!("skill{}", i % 8), format!("action{i}")).handler(handler))
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(registry.len(), 64);
    assert_eq!(registry.skill_definitions().len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatch_of_same_action_is_attributed() {
    let registry = Arc::new(ActionRegistry::new());
    let handler = CountingHandler::new("echo");
    registry
        .register(ActionSpec::new("system", "echo").handler(handler.clone()))
        .unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                let result = registry
                    .execute(DispatchRequest::new("system", "echo").with_input(input(&[("tag", i.into())])))
                    .await;
                (i, result)
            })
        })
        .collect();

    for task in tasks {
        let (i, result) = task.await.unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()["tag"], i);
    }
    assert_eq!(handler.calls.load(Ordering::SeqCst), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_handler_does_not_block_registration() {
    let registry = Arc::new(ActionRegistry::new());
    registry.register(sleeping_spec("music", "play")).unwrap();

    let cancel = CancellationToken::new();
    let slow = {
        let registry = registry.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            registry
                .execute(DispatchRequest::new("music", "play").with_cancel(cancel))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    registry
        .register(ActionSpec::new("music", "pause").handler(CountingHandler::new("ok")))
        .unwrap();
    let paused = registry.execute(DispatchRequest::new("music", "pause")).await;
    assert!(paused.success);

    cancel.cancel();
    let result = slow.await.unwrap();
    assert_eq!(result.error_kind(), Some(ActionErrorKind::Cancelled));
}

// ---------------------------------------------------------------------------
// Cancellation and deadlines
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn expired_deadline_yields_timeout_result() {
    let registry = ActionRegistry::new();
    registry.register(sleeping_spec("music", "play")).unwrap();

    let result = registry
        .execute(DispatchRequest::new("music", "play").with_deadline(Duration::from_millis(50)))
        .await;

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ActionErrorKind::Timeout));
    assert!(result.message.contains("music.play"));
}

#[tokio::test]
async fn already_cancelled_token_skips_the_handler() {
    let registry = ActionRegistry::new();
    let handler = CountingHandler::new("ok");
    registry
        .register(ActionSpec::new("music", "next").handler(handler.clone()))
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = registry
        .execute(DispatchRequest::new("music", "next").with_cancel(cancel))
        .await;

    assert_eq!(result.error_kind(), Some(ActionErrorKind::Cancelled));
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}
