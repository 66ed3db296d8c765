//! Core types and error definitions for the UpCraft agent runtime.
//!
//! This crate provides the foundational types shared across all UpCraft crates:
//! error handling, conversation messages, provider-neutral tool-call wire types,
//! and the normalized result of a dispatched action.
//!
//! # Main types
//!
//! - [`UpcraftError`]: Unified error enum for startup and turn-level failures.
//! - [`UpcraftResult`]: Convenience alias for `Result<T, UpcraftError>`.
//! - [`Message`] / [`Role`]: A single message within a conversation.
//! - [`ToolCall`]: An LLM-initiated request to invoke `skill.action`.
//! - [`ToolDefinition`]: The function-tool schema handed to a provider.
//! - [`ActionResult`]: The success/failure outcome of one dispatch.

/// Dispatch outcome types.
pub mod action;
/// Error types.
pub mod error;
/// Conversation message types.
pub mod message;
/// Tool call and tool definition wire types.
pub mod tool;

pub use action::{ActionError, ActionErrorKind, ActionResult};
pub use error::{UpcraftError, UpcraftResult};
pub use message::{Message, Role};
pub use tool::{ToolCall, ToolDefinition, ToolFunctionDefinition};
