//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;
type HandlerMap = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<CdpResponse>>>>;

/// Subscription key for events without a `sessionId`.
pub const BROWSER_SESSION: &str = "";

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// CDP client over the browser-level WebSocket.
///
/// Page sessions are flattened onto the same socket; events are routed to
/// subscribers by `sessionId`.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    /// Browser WebSocket URL.
    browser_ws_url: String,
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    /// Requests waiting for their reply.
    pending: PendingMap,
    /// Event subscribers by session ID.
    event_handlers: HandlerMap,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint, e.g. `http://localhost:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = url::Url::parse(endpoint)?
            .as_str()
            .trim_end_matches('/')
            .to_string();

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        debug!("Connected to browser: {}", version.browser);

        let browser_ws_url = version.web_socket_debugger_url;

        let (ws_stream, _) = tokio_tungstenite::connect_async(&browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let event_handlers: HandlerMap = Arc::new(RwLock::new(HashMap::new()));

        let recv_task = {
            let pending = pending.clone();
            let event_handlers = event_handlers.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending, event_handlers).await;
            })
        };

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending,
            event_handlers,
            _recv_task: recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, pending: PendingMap, event_handlers: HandlerMap) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    route_message(text.as_str(), &pending, &event_handlers).await;
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        // Waiters see SessionClosed; subscribers see their stream end.
        pending.lock().clear();
        event_handlers.write().await.clear();
    }

    /// Send a CDP command and wait for its reply.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    /// List all targets the browser exposes over HTTP.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
        Ok(pages)
    }

    /// Attach to a target in flat mode and return the new session ID.
    pub async fn attach_target(&self, target_id: &str) -> Result<String, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
                None,
            )
            .await?;

        result["sessionId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))
    }

    pub async fn detach_session(&self, session_id: &str) -> Result<(), CdpError> {
        self.call(
            "Target.detachFromTarget",
            Some(json!({ "sessionId": session_id })),
            None,
        )
        .await?;
        Ok(())
    }

    /// Receive every event tagged with `session_id`. A later subscription
    /// for the same session replaces the earlier one.
    pub async fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<CdpResponse> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_handlers
            .write()
            .await
            .insert(session_id.to_string(), tx);
        rx
    }

    pub async fn unsubscribe(&self, session_id: &str) {
        self.event_handlers.write().await.remove(session_id);
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

/// Deliver one inbound frame: replies complete their waiter, events go to
/// the subscriber for their session.
async fn route_message(text: &str, pending: &PendingMap, event_handlers: &HandlerMap) {
    trace!("CDP recv: {}", text);

    let resp = match serde_json::from_str::<CdpResponse>(text) {
        Ok(resp) => resp,
        Err(e) => {
            warn!("Failed to parse CDP message: {}", e);
            return;
        }
    };

    if let Some(id) = resp.id {
        let waiter = pending.lock().remove(&id);
        if let Some(tx) = waiter {
            let result = match resp.error {
                Some(error) => Err(CdpError::Protocol {
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(resp.result.unwrap_or(Value::Null)),
            };
            let _ = tx.send(result);
        }
    } else if resp.method.is_some() {
        let session_id = resp
            .session_id
            .clone()
            .unwrap_or_else(|| BROWSER_SESSION.to_string());
        let handlers = event_handlers.read().await;
        if let Some(tx) = handlers.get(&session_id) {
            let _ = tx.send(resp);
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
