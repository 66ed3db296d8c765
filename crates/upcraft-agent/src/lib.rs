//! Agent runtime for UpCraft.
//!
//! Wires the action registry to an LLM provider through the
//! [`ToolCallTranslator`] and [`TurnRunner`], resolves UI screens into
//! click intents with the [`ScreenResolver`], and keeps the skill sync
//! service in step through the [`SyncClient`].

pub mod agent;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod runner;
pub mod screen;
pub mod sync;
pub mod translator;

pub use agent::{Agent, ScreenOutcome};
pub use config::{AgentConfig, ScreenConfig, SyncConfig, UpcraftConfig, RAG_URL_ENV};
pub use conversation::Conversation;
pub use llm::{LlmProvider, LlmResponse, Usage};
pub use runner::{TurnOutcome, TurnRunner, TurnState};
pub use screen::{LabelClickRule, NoopReason, ScreenIntent, ScreenResolver, ScreenRule};
pub use sync::SyncClient;
pub use translator::ToolCallTranslator;
