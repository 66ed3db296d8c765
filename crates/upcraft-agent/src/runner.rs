use crate::config::AgentConfig;
use crate::conversation::Conversation;
use crate::llm::{LlmProvider, LlmResponse, Usage};
use crate::translator::ToolCallTranslator;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use upcraft_core::{Message, UpcraftError, UpcraftResult};
use upcraft_skills::ActionRegistry;

/// Where the turn driver is in one user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting on the provider.
    AwaitingModelTurn,
    /// The response requested tools.
    HasToolCalls,
    /// Running the requested tools in order.
    Dispatching,
    /// The response was a final answer.
    NoToolCalls,
    /// The turn finished with an answer.
    Done,
}

/// Summary of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The final assistant content.
    pub answer: String,
    /// Model responses consumed, including the final one.
    pub model_turns: u32,
    /// Tool calls dispatched.
    pub dispatched: usize,
    /// Dispatched calls whose result was a failure.
    pub failed: usize,
    /// Usage summed across model responses.
    pub usage: Usage,
    /// Every state entered, in order.
    pub states: Vec<TurnState>,
}

/// Drives one agent turn.
/// Conversation → provider → tool calls → registry → tool messages → repeat.
pub struct TurnRunner {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ActionRegistry>,
    translator: ToolCallTranslator,
    max_turns: u32,
    dispatch_timeout: Option<Duration>,
    model: Option<String>,
}

impl TurnRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, registry: Arc<ActionRegistry>, config: &AgentConfig) -> Self {
        Self {
            provider,
            translator: ToolCallTranslator::new(registry.clone()),
            registry,
            max_turns: config.max_turns,
            dispatch_timeout: config.dispatch_timeout(),
            model: config.model.clone(),
        }
    }

    /// Runs the loop until the model stops requesting tools.
    ///
    /// Tool calls are dispatched one at a time in the order received. Any
    /// dispatch failure is reported to the model as a tool message; only a
    /// provider error, cancellation of `cancel`, or running out of model turns
    /// ends the turn with an error.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        cancel: &CancellationToken,
    ) -> UpcraftResult<TurnOutcome> {
        let tools = self.registry.tool_definitions();
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string());

        let mut outcome = TurnOutcome {
            answer: String::new(),
            model_turns: 0,
            dispatched: 0,
            failed: 0,
            usage: Usage::default(),
            states: Vec::new(),
        };

        info!(conversation = %conversation.id(), tools = tools.len(), "Starting turn");

        for turn in 0..self.max_turns {
            enter(&mut outcome, TurnState::AwaitingModelTurn);
            if cancel.is_cancelled() {
                return Err(UpcraftError::Cancelled);
            }

            let messages = conversation.provider_messages();
            let response: LlmResponse = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(UpcraftError::Cancelled),
                response = self.provider.chat(&messages, &tools, &model, cancel) => response?,
            };
            outcome.model_turns += 1;
            if let Some(usage) = response.usage {
                outcome.usage += usage;
            }

            if !response.has_tool_calls() {
                enter(&mut outcome, TurnState::NoToolCalls);
                conversation.push(Message::assistant(response.content.clone()));
                outcome.answer = response.content;
                enter(&mut outcome, TurnState::Done);
                info!(
                    conversation = %conversation.id(),
                    turns = turn + 1,
                    dispatched = outcome.dispatched,
                    "Turn completed"
                );
                return Ok(outcome);
            }

            enter(&mut outcome, TurnState::HasToolCalls);
            conversation.push(Message::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            enter(&mut outcome, TurnState::Dispatching);
            for call in &response.tool_calls {
                let (result, message) = self
                    .translator
                    .dispatch_to_message(call, cancel.child_token(), self.dispatch_timeout)
                    .await;
                outcome.dispatched += 1;
                if !result.success {
                    outcome.failed += 1;
                }
                conversation.push(message);
            }
        }

        warn!(
            conversation = %conversation.id(),
            max_turns = self.max_turns,
            "Turn reached max model turns"
        );
        Err(UpcraftError::TurnBudgetExceeded {
            max_turns: self.max_turns,
        })
    }
}

fn enter(outcome: &mut TurnOutcome, state: TurnState) {
    debug!(state = ?state, "Turn state");
    outcome.states.push(state);
}
