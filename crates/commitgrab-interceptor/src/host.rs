//! Host browser abstraction.
//!
//! The interceptor never talks to a browser directly. It sees a debugger
//! surface (attach, send a protocol command, detach), a tab surface (find,
//! reload) and a stream of [`HostEvent`]s.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identifier of a debuggable tab.
///
/// Accepts numeric tab ids as well as string target ids when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for TargetId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => TargetId(n.to_string()),
            Raw::Text(s) => TargetId(s),
        })
    }
}

/// Events the host reports for attached targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// `Network.responseReceived` on an attached target.
    ResponseReceived {
        target: TargetId,
        request_id: String,
        url: String,
    },
    /// The tab went away or the browser dropped our debugger session.
    TargetClosed { target: TargetId },
}

/// Opaque host failure. Detail is for logs, not for users.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Debugger protocol access, one session per target.
#[async_trait]
pub trait DebuggerHost: Send + Sync {
    /// Open a debugger session on the target.
    async fn attach(&self, target: &TargetId) -> Result<(), HostError>;

    /// Send a protocol command to an attached target.
    async fn send_command(
        &self,
        target: &TargetId,
        method: &str,
        params: Value,
    ) -> Result<Value, HostError>;

    /// Close the debugger session on the target.
    async fn detach(&self, target: &TargetId) -> Result<(), HostError>;
}

/// Tab discovery and control.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// The focused tab, if any.
    async fn active_tab(&self) -> Result<Option<TargetId>, HostError>;

    async fn tab_exists(&self, target: &TargetId) -> Result<bool, HostError>;

    /// Reload the tab, bypassing the cache.
    async fn reload(&self, target: &TargetId) -> Result<(), HostError>;
}
