//! Debug-attach gateway.
//!
//! Wraps a [`DebuggerHost`] with the attach discipline the interceptor
//! relies on: a target is only registered once network observation is
//! enabled, and detaching is best-effort and idempotent.

use std::collections::HashSet;
use std::sync::Arc;

use base64::Engine;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::host::{DebuggerHost, TargetId};

/// Gateway errors. Host detail is flattened into the message.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Failed to attach debugger to {target}: {message}")]
    Attach { target: TargetId, message: String },

    #[error("Failed to enable network events on {target}: {message}")]
    NetworkEnable { target: TargetId, message: String },

    #[error("Failed to read response body on {target}: {message}")]
    ResponseBody { target: TargetId, message: String },
}

/// `Network.getResponseBody` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    body: String,
    #[serde(default)]
    base64_encoded: bool,
}

/// Tracks which targets are attached and owns their lifecycle.
pub struct DebugGateway {
    host: Arc<dyn DebuggerHost>,
    attached: Mutex<HashSet<TargetId>>,
}

impl DebugGateway {
    pub fn new(host: Arc<dyn DebuggerHost>) -> Self {
        Self {
            host,
            attached: Mutex::new(HashSet::new()),
        }
    }

    /// Attach and enable network observation.
    ///
    /// The target is registered only when both steps succeed; a session left
    /// half-open by a failed `Network.enable` is released again.
    pub async fn attach(&self, target: &TargetId) -> Result<(), GatewayError> {
        self.host
            .attach(target)
            .await
            .map_err(|e| GatewayError::Attach {
                target: target.clone(),
                message: e.to_string(),
            })?;

        if let Err(e) = self
            .host
            .send_command(target, "Network.enable", json!({}))
            .await
        {
            if let Err(detach_err) = self.host.detach(target).await {
                warn!("Detach after failed Network.enable on {}: {}", target, detach_err);
            }
            return Err(GatewayError::NetworkEnable {
                target: target.clone(),
                message: e.to_string(),
            });
        }

        self.attached.lock().insert(target.clone());
        debug!("Debugger attached to {}", target);
        Ok(())
    }

    /// Detach if attached. Never fails; host errors are logged.
    pub async fn detach(&self, target: &TargetId) {
        let was_attached = self.attached.lock().remove(target);
        if !was_attached {
            return;
        }

        match self.host.detach(target).await {
            Ok(()) => debug!("Debugger detached from {}", target),
            Err(e) => warn!("Detach from {} reported an error: {}", target, e),
        }
    }

    /// Fetch a response body captured on an attached target.
    pub async fn get_response_body(
        &self,
        target: &TargetId,
        request_id: &str,
    ) -> Result<String, GatewayError> {
        let body_error = |message: String| GatewayError::ResponseBody {
            target: target.clone(),
            message,
        };

        if !self.is_attached(target) {
            return Err(body_error("target is not attached".to_string()));
        }

        let result = self
            .host
            .send_command(
                target,
                "Network.getResponseBody",
                json!({ "requestId": request_id }),
            )
            .await
            .map_err(|e| body_error(e.to_string()))?;

        let response: ResponseBody =
            serde_json::from_value(result).map_err(|e| body_error(e.to_string()))?;

        if !response.base64_encoded {
            return Ok(response.body);
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(response.body.as_bytes())
            .map_err(|e| body_error(format!("invalid base64 body: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| body_error(format!("body is not UTF-8: {}", e)))
    }

    pub fn is_attached(&self, target: &TargetId) -> bool {
        self.attached.lock().contains(target)
    }

    /// Snapshot of the attachment registry.
    pub fn attached(&self) -> Vec<TargetId> {
        self.attached.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
