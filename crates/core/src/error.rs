//! Error types shared by the stage state machines.

/// Local input that the state machines refuse to act on.
///
/// These never change state: the caller keeps whatever it had and can show
/// the message inline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("stage name must not be empty")]
    EmptyIdentity,
    #[error("scenario text must not be empty")]
    EmptyScenario,
}

/// The realtime session refused to start.
#[derive(Debug, thiserror::Error)]
pub enum SessionStartError {
    #[error("realtime session rejected start: {0:#}")]
    Rejected(anyhow::Error),
}

impl SessionStartError {
    /// Text suitable for showing next to the start button.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionStartError::Rejected(_) => "Couldn't reach the stage. Please try again.",
        }
    }
}

/// Everything `BootstrapController::start` can surface to its caller.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Start(#[from] SessionStartError),
}

/// A custom error type for configuration loading failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("required config field `{0}` resolved to an empty value")]
    EmptyField(&'static str),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Failure writing to local durable storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not a JSON object: {0}")]
    Format(#[from] serde_json::Error),
}
