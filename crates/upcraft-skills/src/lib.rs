//! Action contracts and the action registry for UpCraft.
//!
//! Capability providers describe each action with an [`ActionSpec`]; the
//! [`ActionRegistry`] validates it into an immutable [`ActionContract`],
//! dispatches [`DispatchRequest`]s to its handler, and exports the registered
//! set as provider tool definitions and sync-service skill definitions.

pub mod contract;
pub mod definition;
pub mod error;
pub mod registry;
pub mod request;

pub use contract::{
    default_input_schema, handler_fn, ActionContract, ActionHandler, ActionInput, ActionKey,
    ActionSpec, FnHandler, HandlerError,
};
pub use definition::{ActionDefinition, RemoteSkill, SkillDefinition, DEFAULT_SKILL_DESCRIPTION};
pub use error::RegistrationError;
pub use registry::ActionRegistry;
pub use request::DispatchRequest;
