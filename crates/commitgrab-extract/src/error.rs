//! Extraction and formatting errors.

use thiserror::Error;

/// Errors raised while turning a response body into commit records.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The body was not the expected `{ "html": ... }` JSON envelope.
    #[error("Invalid commit payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The payload parsed but no commit block carried every required field.
    #[error("No commits found in payload")]
    NoCommits,
}

/// A user-supplied pattern string that does not compile.
#[derive(Debug, Error)]
#[error("Invalid pattern '{pattern}': {message}")]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

impl PatternError {
    pub fn new(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}
