//! Interception session controller.
//!
//! Two states, idle and active, plus at most one pending timeout. Every
//! `start` opens a new epoch; a [`SessionTicket`] names the epoch it was
//! issued for, so late completions and stale timers from an earlier session
//! can never end a newer one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle naming one start-to-stop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTicket(u64);

impl SessionTicket {
    pub fn epoch(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct SessionState {
    active: bool,
    epoch: u64,
    pending_timeout: Option<JoinHandle<()>>,
}

impl SessionState {
    fn is_current(&self, ticket: SessionTicket) -> bool {
        self.active && self.epoch == ticket.0
    }

    fn clear_timeout(&mut self) {
        if let Some(handle) = self.pending_timeout.take() {
            handle.abort();
        }
    }
}

/// Owns the "capture in progress" flag and its deadline.
///
/// Cloning shares the same underlying session.
#[derive(Clone, Default)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Ticket of the running session, if any.
    pub fn current(&self) -> Option<SessionTicket> {
        let state = self.state.lock();
        state.active.then_some(SessionTicket(state.epoch))
    }

    pub fn has_pending_timeout(&self) -> bool {
        self.state.lock().pending_timeout.is_some()
    }

    /// Enter the active state, clearing any leftover timeout.
    pub fn start(&self) -> SessionTicket {
        let mut state = self.state.lock();
        state.clear_timeout();
        state.epoch += 1;
        state.active = true;
        debug!(epoch = state.epoch, "Session started");
        SessionTicket(state.epoch)
    }

    /// Start only when idle.
    pub fn try_start(&self) -> Option<SessionTicket> {
        let mut state = self.state.lock();
        if state.active {
            return None;
        }
        state.clear_timeout();
        state.epoch += 1;
        state.active = true;
        debug!(epoch = state.epoch, "Session started");
        Some(SessionTicket(state.epoch))
    }

    /// Return to idle and drop the pending timeout. Idempotent.
    ///
    /// Returns whether a session was actually active.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        state.clear_timeout();
        let was_active = std::mem::replace(&mut state.active, false);
        if was_active {
            debug!(epoch = state.epoch, "Session stopped");
        }
        was_active
    }

    /// Stop the session named by `ticket` if it is still the running one.
    ///
    /// Exactly one caller per session gets `true`; that caller owns the
    /// session's outcome.
    pub fn finish(&self, ticket: SessionTicket) -> bool {
        let mut state = self.state.lock();
        if !state.is_current(ticket) {
            return false;
        }
        state.clear_timeout();
        state.active = false;
        debug!(epoch = ticket.0, "Session finished");
        true
    }

    /// Arm the deadline for `ticket`, replacing any pending one.
    ///
    /// When `delay` elapses the callback runs only if the same session is
    /// still active. The callback is expected to claim the session through
    /// [`finish`](Self::finish). Arming for a session that is no longer
    /// current does nothing.
    pub fn arm_timeout<F, Fut>(&self, ticket: SessionTicket, delay: Duration, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state.lock();
        state.clear_timeout();
        if !state.is_current(ticket) {
            debug!(epoch = ticket.0, "Not arming timeout for stale session");
            return;
        }

        let shared = self.state.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let fire = {
                let mut state = shared.lock();
                if state.is_current(ticket) {
                    // Release our own handle so `finish` inside the callback
                    // does not abort this task.
                    state.pending_timeout = None;
                    true
                } else {
                    false
                }
            };

            if fire {
                debug!(epoch = ticket.0, "Session timeout fired");
                callback().await;
            }
        });

        state.pending_timeout = Some(handle);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
