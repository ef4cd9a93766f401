//! Capture orchestration.
//!
//! One capture runs Idle -> Attaching -> Watching -> Completing/Failing ->
//! Idle. A start request resolves the tab, attaches, arms the deadline and
//! reloads the tab; the first matching `Network.responseReceived` event is
//! read, parsed and formatted. Whichever of completion, failure or timeout
//! claims the session first delivers the only result, after the session is
//! idle and the tab detached.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use commitgrab_extract::{parse_response_body, CommitMessageFormatter, FormattedMessage, PatternError};

use crate::error::CaptureError;
use crate::gateway::DebugGateway;
use crate::host::{DebuggerHost, HostEvent, TabHost, TargetId};
use crate::message::{MessageDispatcher, StartRequest, StartResponse};
use crate::session::{SessionController, SessionTicket};

/// Interceptor configuration.
#[derive(Debug, Clone)]
pub struct InterceptorConfig {
    /// Substring the captured response URL must contain.
    pub url_filter: String,
    /// Budget from start to forced failure.
    pub timeout: Duration,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            url_filter: "commits.json".to_string(),
            timeout: Duration::from_millis(5000),
        }
    }
}

/// The capture currently owning the session.
#[derive(Debug)]
struct Capture {
    ticket: SessionTicket,
    target: TargetId,
    /// A matching response is already being read.
    body_requested: bool,
}

struct Inner {
    config: InterceptorConfig,
    session: SessionController,
    gateway: DebugGateway,
    tabs: Arc<dyn TabHost>,
    formatter: RwLock<CommitMessageFormatter>,
    dispatcher: MessageDispatcher,
    capture: Mutex<Option<Capture>>,
}

/// Coordinates session, gateway, parser and formatter for one capture at a
/// time. Cloning shares the same interceptor.
#[derive(Clone)]
pub struct Interceptor {
    inner: Arc<Inner>,
}

impl Interceptor {
    pub fn new(
        config: InterceptorConfig,
        debugger: Arc<dyn DebuggerHost>,
        tabs: Arc<dyn TabHost>,
        formatter: CommitMessageFormatter,
        dispatcher: MessageDispatcher,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                session: SessionController::new(),
                gateway: DebugGateway::new(debugger),
                tabs,
                formatter: RwLock::new(formatter),
                dispatcher,
                capture: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.inner.session
    }

    pub fn gateway(&self) -> &DebugGateway {
        &self.inner.gateway
    }

    /// Replace the ticket pattern; an invalid pattern leaves it unchanged.
    pub fn set_ticket_regex(&self, raw: &str) -> Result<(), PatternError> {
        self.inner.formatter.write().set_ticket_regex(raw)
    }

    /// Replace the clean pattern; an invalid pattern leaves it unchanged.
    pub fn set_clean_regex(&self, raw: &str) -> Result<(), PatternError> {
        self.inner.formatter.write().set_clean_regex(raw)
    }

    /// Handle a start command from the UI.
    pub async fn handle_request(&self, request: StartRequest) -> StartResponse {
        match self.start(request.target().cloned()).await {
            Ok(_) => StartResponse::Success,
            Err(e) => {
                error!("Capture start failed: {}", e);
                StartResponse::Error {
                    message: e.user_message().to_string(),
                }
            }
        }
    }

    /// Begin a capture on `target`, or on the active tab.
    ///
    /// Errors here are reported to the caller only; no result is dispatched.
    pub async fn start(&self, target: Option<TargetId>) -> Result<TargetId, CaptureError> {
        let target = self.resolve_target(target).await?;

        let ticket = {
            let mut slot = self.inner.capture.lock();
            if slot.is_some() {
                return Err(CaptureError::Busy);
            }
            let ticket = self.inner.session.try_start().ok_or(CaptureError::Busy)?;
            *slot = Some(Capture {
                ticket,
                target: target.clone(),
                body_requested: false,
            });
            ticket
        };
        info!(%target, epoch = ticket.epoch(), "Starting commit capture");

        if let Err(e) = self.inner.gateway.attach(&target).await {
            self.release(ticket, &target).await;
            return Err(e.into());
        }
        self.ensure_current(ticket, &target).await?;

        let this = self.clone();
        let timeout_target = target.clone();
        let timeout_ms = self.inner.config.timeout.as_millis() as u64;
        self.inner
            .session
            .arm_timeout(ticket, self.inner.config.timeout, move || async move {
                this.complete(ticket, timeout_target, Err(CaptureError::Timeout(timeout_ms)))
                    .await;
            });

        if let Err(e) = self.inner.tabs.reload(&target).await {
            self.release(ticket, &target).await;
            return Err(CaptureError::Reload(e.to_string()));
        }
        self.ensure_current(ticket, &target).await?;

        debug!(%target, "Tab reloaded, watching network");
        Ok(target)
    }

    /// Detach a target whose capture was already ended by another path while
    /// `start` was awaiting the host.
    async fn ensure_current(
        &self,
        ticket: SessionTicket,
        target: &TargetId,
    ) -> Result<(), CaptureError> {
        if self.inner.session.current() == Some(ticket) {
            return Ok(());
        }
        warn!(%target, epoch = ticket.epoch(), "Capture ended during setup, detaching");
        self.inner.gateway.detach(target).await;
        Err(CaptureError::Interrupted)
    }

    /// Feed host events until the stream ends. Each event runs on its own
    /// task so a slow body read never holds up tab-closure events.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            let this = self.clone();
            tokio::spawn(async move { this.handle_event(event).await });
        }
        debug!("Host event stream closed");
    }

    /// React to a single host event.
    pub async fn handle_event(&self, event: HostEvent) {
        match event {
            HostEvent::ResponseReceived {
                target,
                request_id,
                url,
            } => self.on_response(target, request_id, url).await,
            HostEvent::TargetClosed { target } => self.on_target_closed(target).await,
        }
    }

    async fn on_response(&self, target: TargetId, request_id: String, url: String) {
        let Some(ticket) = self.claim_response(&target, &url) else {
            return;
        };
        info!(%target, %url, "Commit list response observed");

        let body = match self.inner.gateway.get_response_body(&target, &request_id).await {
            Ok(body) => body,
            Err(e) => {
                self.complete(ticket, target, Err(e.into())).await;
                return;
            }
        };

        if body.trim().is_empty() {
            debug!(%url, "Empty response body, still watching");
            if let Some(capture) = self.inner.capture.lock().as_mut() {
                if capture.ticket == ticket {
                    capture.body_requested = false;
                }
            }
            return;
        }

        let outcome = self.extract(&body);
        self.complete(ticket, target, outcome).await;
    }

    /// The active capture's ticket if this response is the one to read.
    fn claim_response(&self, target: &TargetId, url: &str) -> Option<SessionTicket> {
        let mut slot = self.inner.capture.lock();
        let capture = slot.as_mut()?;

        if !self.inner.session.is_active()
            || capture.body_requested
            || &capture.target != target
            || !url.contains(&self.inner.config.url_filter)
        {
            return None;
        }

        capture.body_requested = true;
        Some(capture.ticket)
    }

    async fn on_target_closed(&self, target: TargetId) {
        let ticket = {
            let slot = self.inner.capture.lock();
            match slot.as_ref() {
                Some(capture) if capture.target == target => capture.ticket,
                _ => return,
            }
        };
        warn!(%target, "Target closed during capture");
        self.complete(ticket, target, Err(CaptureError::TargetClosed)).await;
    }

    fn extract(&self, body: &str) -> Result<Vec<FormattedMessage>, CaptureError> {
        let commits =
            parse_response_body(body).map_err(|e| CaptureError::Parsing(e.to_string()))?;
        let formatted = self.inner.formatter.read().format(&commits);
        debug!(commits = commits.len(), "Formatted commit messages");
        Ok(formatted.messages)
    }

    /// Claim the session, clean up, and deliver the outcome.
    async fn complete(
        &self,
        ticket: SessionTicket,
        target: TargetId,
        outcome: Result<Vec<FormattedMessage>, CaptureError>,
    ) {
        if !self.release(ticket, &target).await {
            debug!(epoch = ticket.epoch(), "Session already finished, dropping outcome");
            return;
        }

        match outcome {
            Ok(messages) => {
                info!(%target, count = messages.len(), "Commit capture complete");
                self.inner.dispatcher.send_success(messages);
            }
            Err(e) => {
                error!(%target, "Commit capture failed: {}", e);
                self.inner.dispatcher.send_error(e.user_message());
            }
        }
    }

    /// Stop the session named by `ticket` and detach. Returns `false` when
    /// another path already did.
    async fn release(&self, ticket: SessionTicket, target: &TargetId) -> bool {
        if !self.inner.session.finish(ticket) {
            return false;
        }
        self.inner.gateway.detach(target).await;

        let mut slot = self.inner.capture.lock();
        if slot.as_ref().is_some_and(|c| c.ticket == ticket) {
            *slot = None;
        }
        true
    }

    async fn resolve_target(&self, explicit: Option<TargetId>) -> Result<TargetId, CaptureError> {
        let tabs = &self.inner.tabs;
        match explicit {
            Some(target) => {
                let exists = tabs
                    .tab_exists(&target)
                    .await
                    .map_err(|e| CaptureError::Resolution(e.to_string()))?;
                if exists {
                    Ok(target)
                } else {
                    Err(CaptureError::Resolution(format!("tab {} not found", target)))
                }
            }
            None => tabs
                .active_tab()
                .await
                .map_err(|e| CaptureError::Resolution(e.to_string()))?
                .ok_or_else(|| CaptureError::Resolution("no active tab".to_string())),
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
