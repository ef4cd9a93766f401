//! Commit data types shared by the parser, formatter and the interceptor.

use serde::{Deserialize, Serialize};

/// JSON envelope of the commit-list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitsPayload {
    pub html: String,
}

/// One commit scraped from the commit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit title line.
    pub message: String,
    /// Optional body, entity-decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Timestamp exactly as the page rendered it.
    pub date: String,
    pub author: String,
    /// Short hash label as displayed.
    pub sha: String,
}

/// A display/export line derived from a [`CommitRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedMessage {
    /// Ticket key, or empty when no ticket was found.
    pub key: String,
    pub text: String,
}

impl FormattedMessage {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }
}

/// Output of [`crate::CommitMessageFormatter::format`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedCommits {
    pub messages: Vec<FormattedMessage>,
}
