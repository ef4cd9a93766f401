//! Typed message contract between the interceptor and its UI.
//!
//! The JSON shapes match what the popup sends and listens for:
//!
//! ```text
//! request : { "action": "START_INTERCEPTOR_COMMIT", "data": { "targetTabId": 12 } }
//! response: { "status": "success" } | { "status": "error", "message": "..." }
//! result  : { "type": "success", "action": "COPY_TO_CLIPBOARD", "data": { "messages": [...] } }
//!         | { "type": "error", "action": "INTERCEPTOR_COMMIT_FAILED", "error": "..." }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use commitgrab_extract::FormattedMessage;

use crate::host::TargetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestAction {
    StartInterceptorCommit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartData {
    #[serde(rename = "targetTabId", default, skip_serializing_if = "Option::is_none")]
    pub target_tab_id: Option<TargetId>,
}

/// Start command from the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub action: RequestAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StartData>,
}

impl StartRequest {
    /// Start on an explicit tab, or on the active tab when `None`.
    pub fn new(target: Option<TargetId>) -> Self {
        Self {
            action: RequestAction::StartInterceptorCommit,
            data: target.map(|t| StartData {
                target_tab_id: Some(t),
            }),
        }
    }

    pub fn target(&self) -> Option<&TargetId> {
        self.data.as_ref().and_then(|d| d.target_tab_id.as_ref())
    }
}

/// Immediate answer to a [`StartRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StartResponse {
    Success,
    Error { message: String },
}

impl StartResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, StartResponse::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuccessAction {
    CopyToClipboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorAction {
    InterceptorCommitFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyData {
    pub messages: Vec<FormattedMessage>,
}

/// Capture outcome pushed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    Success {
        action: SuccessAction,
        data: CopyData,
    },
    Error {
        action: ErrorAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Sending half of the result channel.
#[derive(Debug, Clone)]
pub struct MessageDispatcher {
    tx: mpsc::UnboundedSender<MessagePayload>,
}

impl MessageDispatcher {
    /// Create a dispatcher and the receiver the UI listens on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MessagePayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send_success(&self, messages: Vec<FormattedMessage>) {
        self.dispatch(MessagePayload::Success {
            action: SuccessAction::CopyToClipboard,
            data: CopyData { messages },
        });
    }

    pub fn send_error(&self, error: impl Into<String>) {
        self.dispatch(MessagePayload::Error {
            action: ErrorAction::InterceptorCommitFailed,
            error: Some(error.into()),
        });
    }

    fn dispatch(&self, payload: MessagePayload) {
        debug!(?payload, "Dispatching capture result");
        if self.tx.send(payload).is_err() {
            warn!("No listener for capture result");
        }
    }
}
