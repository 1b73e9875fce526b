//! Error types for the episode calendar pipeline.

use thiserror::Error;

/// Errors that can occur while building an episode feed.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CalendarError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CalendarError::NotFound(_))
    }
}

/// Result type alias for episode calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
