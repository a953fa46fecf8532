use thiserror::Error;

/// Unified result type for the navigation crate.
pub type Result<T> = std::result::Result<T, NavError>;

/// Errors surfaced by the navigation controller and its host adapters.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("navigation manager already initialized")]
    AlreadyInitialized,
    #[error("navigation manager not initialized")]
    NotInitialized,
    #[error("stack `{0}` not found")]
    StackNotFound(String),
    #[error("cannot restore stack `{tab}`: {reason}")]
    RestoreInconsistency { tab: String, reason: String },
    #[error("screen tag `{0}` already attached")]
    TagCollision(String),
    #[error("invalid navigation state: {0}")]
    InvalidState(String),
    #[error("screen host error: {0}")]
    Host(String),
    #[error("navigation manager is busy with another operation")]
    Reentrant,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NavError {
    /// Errors the controller recovers from locally instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NavError::RestoreInconsistency { .. })
    }
}
