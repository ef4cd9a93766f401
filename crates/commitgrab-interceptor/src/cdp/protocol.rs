//! CDP protocol types and message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP response or event message.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

impl CdpResponse {
    /// Event params decoded as `T`, if this is the named event.
    pub fn event_params<T: serde::de::DeserializeOwned>(&self, method: &str) -> Option<T> {
        if self.method.as_deref() != Some(method) {
            return None;
        }
        serde_json::from_value(self.params.clone()?).ok()
    }
}

/// CDP error in response.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

/// Page info from the `/json/list` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub title: String,
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
    pub dev_tools_frontend_url: Option<String>,
}

impl PageInfo {
    pub fn is_page(&self) -> bool {
        self.page_type == "page"
    }
}

/// Browser version info.
///
/// Note: Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    #[serde(rename = "User-Agent")]
    pub user_agent: String,
    #[serde(rename = "V8-Version")]
    pub v8_version: Option<String>,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

// ============================================================================
// Network Events
// ============================================================================

/// `Network.responseReceived` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedParams {
    pub request_id: String,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub response: NetworkResponse,
}

/// `Network.Response`, reduced to what is logged or matched on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub url: String,
    pub status: i64,
    pub mime_type: Option<String>,
}

// ============================================================================
// Target Events
// ============================================================================

/// `Target.targetDestroyed` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDestroyedParams {
    pub target_id: String,
}

/// `Target.detachedFromTarget` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedFromTargetParams {
    pub session_id: String,
    pub target_id: Option<String>,
}

/// `Inspector.detached` params.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectorDetachedParams {
    pub reason: String,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
