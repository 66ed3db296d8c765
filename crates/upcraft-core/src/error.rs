use thiserror::Error;

/// A convenience `Result` alias using [`UpcraftError`].
pub type UpcraftResult<T> = Result<T, UpcraftError>;

/// Top-level error type for the UpCraft runtime.
///
/// Dispatch-level failures never surface here: they are folded into a failed
/// [`ActionResult`](crate::ActionResult). This enum covers programmer errors
/// (registration) and turn-level failures that the caller must handle.
#[derive(Error, Debug)]
pub enum UpcraftError {
    /// An error originating from the turn driver.
    #[error("Agent error: {0}")]
    Agent(String),

    /// The turn driver ran out of iterations before the model stopped calling tools.
    #[error("Turn budget exceeded: no final answer after {max_turns} model turns")]
    TurnBudgetExceeded {
        /// The configured iteration budget.
        max_turns: u32,
    },

    /// The turn was cancelled by its caller.
    #[error("Turn cancelled")]
    Cancelled,

    /// A contract could not be registered. Fatal at startup.
    #[error("Registration error: {0}")]
    Registration(String),

    /// An error raised by a skill outside of dispatch.
    #[error("Skill error: {0}")]
    Skill(String),

    /// An error talking to the skill sync service.
    #[error("Sync error: {0}")]
    Sync(String),

    /// An error from an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
