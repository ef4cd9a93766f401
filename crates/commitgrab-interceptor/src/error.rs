//! Capture failure taxonomy.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Why a capture did not produce messages.
///
/// Every variant is terminal for the session. [`user_message`] gives the one
/// line shown to users; the `Display` form carries detail for logs.
///
/// [`user_message`]: CaptureError::user_message
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No capture target: {0}")]
    Resolution(String),

    #[error("A capture is already running")]
    Busy,

    #[error("Attach failed: {0}")]
    Attach(String),

    #[error("Network enable failed: {0}")]
    NetworkEnable(String),

    #[error("Reload failed: {0}")]
    Reload(String),

    #[error("No commit list response within {0} ms")]
    Timeout(u64),

    #[error("Response body unavailable: {0}")]
    ResponseBody(String),

    #[error("Parsing failed: {0}")]
    Parsing(String),

    #[error("Target closed during capture")]
    TargetClosed,

    /// Another path ended the capture while it was still being set up.
    #[error("Capture ended during setup")]
    Interrupted,
}

impl CaptureError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::Resolution(_) => "No tab to capture. Open the merge request commits tab.",
            CaptureError::Busy => "A capture is already in progress.",
            CaptureError::Attach(_) => "Could not attach the debugger to the tab.",
            CaptureError::NetworkEnable(_) => "Could not watch network traffic on the tab.",
            CaptureError::Reload(_) => "Could not reload the tab.",
            CaptureError::Timeout(_) => "Timed out waiting for the commit list.",
            CaptureError::ResponseBody(_) => "Failed to read the commit list response.",
            CaptureError::Parsing(_) => "Failed to parse commit data.",
            CaptureError::TargetClosed => "The tab was closed before commits were captured.",
            CaptureError::Interrupted => "The capture was interrupted.",
        }
    }
}

impl From<GatewayError> for CaptureError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Attach { .. } => CaptureError::Attach(e.to_string()),
            GatewayError::NetworkEnable { .. } => CaptureError::NetworkEnable(e.to_string()),
            GatewayError::ResponseBody { .. } => CaptureError::ResponseBody(e.to_string()),
        }
    }
}
