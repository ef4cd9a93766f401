//! [`DebuggerHost`] and [`TabHost`] over a live Chrome instance.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::client::{CdpClient, BROWSER_SESSION};
use super::error::CdpError;
use super::protocol::{
    CdpResponse, DetachedFromTargetParams, InspectorDetachedParams, PageInfo,
    ResponseReceivedParams, TargetDestroyedParams,
};
use crate::host::{DebuggerHost, HostError, HostEvent, TabHost, TargetId};

/// A flattened debugger session and the task forwarding its events.
struct AttachedSession {
    session_id: String,
    forwarder: JoinHandle<()>,
}

type SessionMap = Arc<Mutex<HashMap<TargetId, AttachedSession>>>;

/// Chrome-backed host.
pub struct CdpHost {
    client: CdpClient,
    sessions: SessionMap,
    events: mpsc::UnboundedSender<HostEvent>,
    watcher: JoinHandle<()>,
}

impl CdpHost {
    /// Connect to the debugging endpoint and start watching target lifecycle.
    ///
    /// The receiver yields events for attached targets only.
    pub async fn connect(
        endpoint: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<HostEvent>), CdpError> {
        let client = CdpClient::connect(endpoint).await?;
        let browser_events = client.subscribe(BROWSER_SESSION).await;
        client
            .call(
                "Target.setDiscoverTargets",
                Some(json!({ "discover": true })),
                None,
            )
            .await?;

        let sessions: SessionMap = Arc::new(Mutex::new(HashMap::new()));
        let (events, rx) = mpsc::unbounded_channel();

        let watcher = tokio::spawn(watch_targets(
            browser_events,
            sessions.clone(),
            events.clone(),
        ));

        info!("Connected to browser at {}", client.browser_ws_url());
        Ok((
            Self {
                client,
                sessions,
                events,
                watcher,
            },
            rx,
        ))
    }

    /// Page targets, in the browser's order.
    pub async fn list_tabs(&self) -> Result<Vec<PageInfo>, CdpError> {
        let pages = self.client.list_pages().await?;
        Ok(pages.into_iter().filter(PageInfo::is_page).collect())
    }

    fn session_id(&self, target: &TargetId) -> Result<String, CdpError> {
        self.sessions
            .lock()
            .get(target)
            .map(|s| s.session_id.clone())
            .ok_or_else(|| CdpError::NotAttached(target.to_string()))
    }
}

impl Drop for CdpHost {
    fn drop(&mut self) {
        self.watcher.abort();
        for (_, session) in self.sessions.lock().drain() {
            session.forwarder.abort();
        }
    }
}

#[async_trait]
impl DebuggerHost for CdpHost {
    async fn attach(&self, target: &TargetId) -> Result<(), HostError> {
        if self.sessions.lock().contains_key(target) {
            return Err(CdpError::AlreadyAttached(target.to_string()).into());
        }

        let session_id = self.client.attach_target(target.as_str()).await?;
        let mut session_events = self.client.subscribe(&session_id).await;

        let events = self.events.clone();
        let forward_target = target.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = session_events.recv().await {
                if let Some(host_event) = session_event(&forward_target, &event) {
                    if events.send(host_event).is_err() {
                        break;
                    }
                }
            }
        });

        debug!(%target, %session_id, "Attached debugger session");
        self.sessions.lock().insert(
            target.clone(),
            AttachedSession {
                session_id,
                forwarder,
            },
        );
        Ok(())
    }

    async fn send_command(
        &self,
        target: &TargetId,
        method: &str,
        params: Value,
    ) -> Result<Value, HostError> {
        let session_id = self.session_id(target)?;
        Ok(self.client.call(method, Some(params), Some(&session_id)).await?)
    }

    async fn detach(&self, target: &TargetId) -> Result<(), HostError> {
        let removed = self.sessions.lock().remove(target);
        let Some(session) = removed else {
            debug!(%target, "Detach requested for a target without a session");
            return Ok(());
        };

        session.forwarder.abort();
        self.client.unsubscribe(&session.session_id).await;
        self.client.detach_session(&session.session_id).await?;
        Ok(())
    }
}

#[async_trait]
impl TabHost for CdpHost {
    async fn active_tab(&self) -> Result<Option<TargetId>, HostError> {
        let tabs = self.list_tabs().await?;
        Ok(tabs.into_iter().next().map(|page| TargetId::new(page.id)))
    }

    async fn tab_exists(&self, target: &TargetId) -> Result<bool, HostError> {
        let tabs = self.list_tabs().await?;
        Ok(tabs.iter().any(|page| page.id == target.as_str()))
    }

    async fn reload(&self, target: &TargetId) -> Result<(), HostError> {
        self.send_command(target, "Page.reload", json!({ "ignoreCache": true }))
            .await?;
        Ok(())
    }
}

/// Turn browser-level target events into closures of attached targets.
async fn watch_targets(
    mut browser_events: mpsc::UnboundedReceiver<CdpResponse>,
    sessions: SessionMap,
    events: mpsc::UnboundedSender<HostEvent>,
) {
    while let Some(event) = browser_events.recv().await {
        let closed = {
            let mut sessions = sessions.lock();
            let target = closed_target(&event, &sessions);
            if let Some(target) = &target {
                if let Some(session) = sessions.remove(target) {
                    session.forwarder.abort();
                }
            }
            target
        };

        if let Some(target) = closed {
            warn!(%target, "Attached target went away");
            if events.send(HostEvent::TargetClosed { target }).is_err() {
                break;
            }
        }
    }
    debug!("Browser event stream ended");
}

/// Map an event on an attached session to a host event.
fn session_event(target: &TargetId, event: &CdpResponse) -> Option<HostEvent> {
    if let Some(params) = event.event_params::<ResponseReceivedParams>("Network.responseReceived") {
        return Some(HostEvent::ResponseReceived {
            target: target.clone(),
            request_id: params.request_id,
            url: params.response.url,
        });
    }

    if let Some(params) = event.event_params::<InspectorDetachedParams>("Inspector.detached") {
        debug!(%target, reason = %params.reason, "Inspector detached");
        return Some(HostEvent::TargetClosed {
            target: target.clone(),
        });
    }

    None
}

/// The attached target a browser-level event reports as gone, if any.
fn closed_target(
    event: &CdpResponse,
    sessions: &HashMap<TargetId, AttachedSession>,
) -> Option<TargetId> {
    if let Some(params) = event.event_params::<TargetDestroyedParams>("Target.targetDestroyed") {
        let target = TargetId::new(params.target_id);
        return sessions.contains_key(&target).then_some(target);
    }

    if let Some(params) =
        event.event_params::<DetachedFromTargetParams>("Target.detachedFromTarget")
    {
        return sessions
            .iter()
            .find(|(_, s)| s.session_id == params.session_id)
            .map(|(target, _)| target.clone());
    }

    None
}
