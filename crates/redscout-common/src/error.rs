use thiserror::Error;

/// Errors surfaced by a `Backend` implementation.
///
/// Strategy code treats every variant as "this attempt produced nothing";
/// only session and navigation code inspects them.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend not ready")]
    NotReady,

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out during {operation}")]
    Timeout { operation: String },

    #[error("Invalid selector: {selector}")]
    SelectorInvalid { selector: String },

    #[error("Element {id} is stale or unknown")]
    ElementStale { id: u64 },

    #[error("Script error: {0}")]
    Script(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Navigation-class failures are worth retrying by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::Navigation(_) | BackendError::Timeout { .. }
        )
    }
}
