use thiserror::Error;
use upcraft_core::UpcraftError;

/// Why a contract was rejected. These are programmer errors: the composition
/// root should abort startup rather than continue with a partial registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Skill or action identifier is empty or whitespace.
    #[error("skill and action are required (got {skill:?}.{action:?})")]
    MissingIdentifier {
        /// Skill as supplied.
        skill: String,
        /// Action as supplied.
        action: String,
    },

    /// No handler was bound to the spec.
    #[error("handler is required for {0}")]
    MissingHandler(String),

    /// The case-insensitive key is already taken.
    #[error("action already registered: {0}")]
    Duplicate(String),
}

impl From<RegistrationError> for UpcraftError {
    fn from(err: RegistrationError) -> Self {
        UpcraftError::Registration(err.to_string())
    }
}
