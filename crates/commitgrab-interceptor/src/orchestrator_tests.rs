use super::*;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use commitgrab_extract::FormattedMessage;

use crate::host::HostError;
use crate::message::MessagePayload;

const ENDPOINT: &str = "https://gitlab.example.com/group/app/-/merge_requests/7/commits.json";

#[derive(Default)]
struct MockBrowser {
    /// First entry is the active tab.
    tabs: Vec<TargetId>,
    bodies: Mutex<HashMap<String, Value>>,
    fail_attach: bool,
    fail_reload: bool,
    /// When set, `attach` waits for a notification before answering.
    attach_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<String>>,
}

impl MockBrowser {
    fn with_tabs(tabs: &[&str]) -> Self {
        Self {
            tabs: tabs.iter().map(|t| TargetId::new(*t)).collect(),
            ..Default::default()
        }
    }

    fn serve(&self, request_id: &str, body: &str) {
        self.bodies.lock().insert(
            request_id.to_string(),
            json!({ "body": body, "base64Encoded": false }),
        );
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl DebuggerHost for MockBrowser {
    async fn attach(&self, target: &TargetId) -> Result<(), HostError> {
        self.calls.lock().push(format!("attach:{}", target));
        if let Some(gate) = &self.attach_gate {
            gate.notified().await;
        }
        if self.fail_attach {
            return Err(HostError::new("Another debugger is already attached to the tab"));
        }
        Ok(())
    }

    async fn send_command(
        &self,
        target: &TargetId,
        method: &str,
        params: Value,
    ) -> Result<Value, HostError> {
        self.calls.lock().push(format!("{}:{}", method, target));
        match method {
            "Network.enable" => Ok(json!({})),
            "Network.getResponseBody" => {
                let request_id = params["requestId"].as_str().unwrap_or_default();
                self.bodies
                    .lock()
                    .get(request_id)
                    .cloned()
                    .ok_or_else(|| HostError::new("No resource with given identifier found"))
            }
            other => Err(HostError::new(format!("unexpected {}", other))),
        }
    }

    async fn detach(&self, target: &TargetId) -> Result<(), HostError> {
        self.calls.lock().push(format!("detach:{}", target));
        Ok(())
    }
}

#[async_trait]
impl TabHost for MockBrowser {
    async fn active_tab(&self) -> Result<Option<TargetId>, HostError> {
        Ok(self.tabs.first().cloned())
    }

    async fn tab_exists(&self, target: &TargetId) -> Result<bool, HostError> {
        Ok(self.tabs.contains(target))
    }

    async fn reload(&self, target: &TargetId) -> Result<(), HostError> {
        self.calls.lock().push(format!("reload:{}", target));
        if self.fail_reload {
            return Err(HostError::new("Cannot navigate to invalid URL"));
        }
        Ok(())
    }
}

fn commit_block(message: &str, description: Option<&str>, sha: &str) -> String {
    let description = description
        .map(|d| format!(r#"<pre class="commit-row-description">{}</pre>"#, d))
        .unwrap_or_default();
    format!(
        r#"<li class="commit flex-row js-toggle-container">
<a class="commit-row-message item-title" href="/c/{sha}">{message}</a>
{description}
<a class="commit-author-link" href="/u/kim">Kim</a>
<time datetime="2024-05-01T10:00:00Z"></time>
<div class="label label-monospace">{sha}</div>
</li>"#
    )
}

fn commits_body() -> String {
    let html = [
        commit_block("fix: login bug", Some("Fixes DEV-12 login bug"), "aaaa1111"),
        commit_block("feat: add export", None, "bbbb2222"),
    ]
    .join("\n");
    json!({ "html": html, "count": 2 }).to_string()
}

fn response(target: &str, request_id: &str, url: &str) -> HostEvent {
    HostEvent::ResponseReceived {
        target: TargetId::new(target),
        request_id: request_id.to_string(),
        url: url.to_string(),
    }
}

fn setup(
    browser: MockBrowser,
) -> (
    Interceptor,
    Arc<MockBrowser>,
    mpsc::UnboundedReceiver<MessagePayload>,
) {
    let browser = Arc::new(browser);
    let (dispatcher, rx) = MessageDispatcher::channel();
    let interceptor = Interceptor::new(
        InterceptorConfig::default(),
        browser.clone(),
        browser.clone(),
        CommitMessageFormatter::new(),
        dispatcher,
    );
    (interceptor, browser, rx)
}

fn expect_error(payload: MessagePayload) -> String {
    match payload {
        MessagePayload::Error { error, .. } => error.unwrap_or_default(),
        other => panic!("expected error payload, got {:?}", other),
    }
}

fn assert_idle_and_detached(interceptor: &Interceptor) {
    assert!(!interceptor.session().is_active());
    assert!(!interceptor.session().has_pending_timeout());
    assert!(interceptor.gateway().attached().is_empty());
}

#[tokio::test]
async fn test_no_active_tab_fails_fast() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::default());

    let result = interceptor.start(None).await;

    assert!(matches!(result, Err(CaptureError::Resolution(_))));
    assert_eq!(browser.count("attach"), 0);
    assert!(interceptor.gateway().attached().is_empty());
    assert!(!interceptor.session().is_active());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_unknown_explicit_tab_fails_fast() {
    let (interceptor, browser, _rx) = setup(MockBrowser::with_tabs(&["1"]));

    let result = interceptor.start(Some(TargetId::new("99"))).await;

    assert!(matches!(result, Err(CaptureError::Resolution(_))));
    assert!(browser.calls().is_empty());
}

#[tokio::test]
async fn test_handle_request_reports_error_status() {
    let (interceptor, _browser, _rx) = setup(MockBrowser::default());

    let response = interceptor.handle_request(StartRequest::new(None)).await;

    assert!(matches!(response, StartResponse::Error { .. }));
}

#[tokio::test]
async fn test_successful_capture() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1", "2"]));
    browser.serve("req-2", &commits_body());

    let start_response = interceptor
        .handle_request(StartRequest::new(Some(TargetId::new("2"))))
        .await;
    assert!(start_response.is_success());
    assert!(interceptor.session().is_active());
    assert!(interceptor.gateway().is_attached(&TargetId::new("2")));

    interceptor
        .handle_event(response("2", "req-1", "https://gitlab.example.com/assets/app.js"))
        .await;
    assert!(interceptor.session().is_active());

    interceptor.handle_event(response("2", "req-2", ENDPOINT)).await;

    let payload = rx.recv().await.unwrap();
    assert_eq!(
        payload,
        MessagePayload::Success {
            action: crate::message::SuccessAction::CopyToClipboard,
            data: crate::message::CopyData {
                messages: vec![
                    FormattedMessage::new("DEV-12", "login bug"),
                    FormattedMessage::new("", "add export"),
                ],
            },
        }
    );
    assert_idle_and_detached(&interceptor);
    assert_eq!(
        browser.calls(),
        vec![
            "attach:2",
            "Network.enable:2",
            "reload:2",
            "Network.getResponseBody:2",
            "detach:2",
        ]
    );
}

#[tokio::test]
async fn test_unreadable_body_fails_and_detaches() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    interceptor.start(None).await.unwrap();

    interceptor
        .handle_event(response("1", "req-1", "https://gitlab.example.com/api/v4/user"))
        .await;
    interceptor.handle_event(response("1", "evicted", ENDPOINT)).await;

    let error = expect_error(rx.recv().await.unwrap());
    assert_eq!(
        error,
        CaptureError::ResponseBody(String::new()).user_message()
    );
    assert_idle_and_detached(&interceptor);
    assert_eq!(browser.count("detach"), 1);
}

#[tokio::test]
async fn test_unparseable_body_reports_parsing_failure() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("req-1", r#"{"html": "<p>nothing here</p>"}"#);
    interceptor.start(None).await.unwrap();

    interceptor.handle_event(response("1", "req-1", ENDPOINT)).await;

    let error = expect_error(rx.recv().await.unwrap());
    assert_eq!(error, CaptureError::Parsing(String::new()).user_message());
    assert_idle_and_detached(&interceptor);
}

#[tokio::test]
async fn test_events_for_other_targets_ignored() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1", "2"]));
    browser.serve("req-1", &commits_body());
    interceptor.start(Some(TargetId::new("1"))).await.unwrap();

    interceptor.handle_event(response("2", "req-1", ENDPOINT)).await;

    assert!(interceptor.session().is_active());
    assert!(rx.try_recv().is_err());
    assert_eq!(browser.count("Network.getResponseBody"), 0);
}

#[tokio::test]
async fn test_events_ignored_when_idle() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("req-1", &commits_body());

    interceptor.handle_event(response("1", "req-1", ENDPOINT)).await;

    assert!(rx.try_recv().is_err());
    assert!(browser.calls().is_empty());
}

#[tokio::test]
async fn test_empty_body_keeps_watching() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("cached", "");
    browser.serve("fresh", &commits_body());
    interceptor.start(None).await.unwrap();

    interceptor.handle_event(response("1", "cached", ENDPOINT)).await;
    assert!(interceptor.session().is_active());
    assert!(rx.try_recv().is_err());

    interceptor.handle_event(response("1", "fresh", ENDPOINT)).await;
    assert!(matches!(
        rx.recv().await.unwrap(),
        MessagePayload::Success { .. }
    ));
}

#[tokio::test]
async fn test_later_matching_events_ignored_after_completion() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("req-1", &commits_body());
    browser.serve("req-2", &commits_body());
    interceptor.start(None).await.unwrap();

    interceptor.handle_event(response("1", "req-1", ENDPOINT)).await;
    interceptor.handle_event(response("1", "req-2", ENDPOINT)).await;

    assert!(matches!(rx.recv().await.unwrap(), MessagePayload::Success { .. }));
    assert!(rx.try_recv().is_err());
    assert_eq!(browser.count("Network.getResponseBody"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_delivers_single_failure() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("late", &commits_body());
    interceptor.start(None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5001)).await;

    let error = expect_error(rx.recv().await.unwrap());
    assert_eq!(error, CaptureError::Timeout(0).user_message());
    assert_idle_and_detached(&interceptor);

    // A response arriving after the timeout changes nothing.
    interceptor.handle_event(response("1", "late", ENDPOINT)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(browser.count("detach"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_completion_before_timeout_delivers_once() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("req-1", &commits_body());
    interceptor.start(None).await.unwrap();

    interceptor.handle_event(response("1", "req-1", ENDPOINT)).await;
    tokio::time::sleep(Duration::from_millis(10_000)).await;

    assert!(matches!(rx.recv().await.unwrap(), MessagePayload::Success { .. }));
    assert!(rx.try_recv().is_err());
    assert_idle_and_detached(&interceptor);
    assert_eq!(browser.count("detach"), 1);
}

#[tokio::test]
async fn test_second_start_while_active_is_busy() {
    let (interceptor, browser, _rx) = setup(MockBrowser::with_tabs(&["1", "2"]));
    interceptor.start(Some(TargetId::new("1"))).await.unwrap();

    let result = interceptor.start(Some(TargetId::new("2"))).await;

    assert!(matches!(result, Err(CaptureError::Busy)));
    assert!(interceptor.session().is_active());
    assert_eq!(interceptor.gateway().attached(), vec![TargetId::new("1")]);
    assert_eq!(browser.count("attach"), 1);
}

#[tokio::test]
async fn test_attach_failure_leaves_session_idle() {
    let (interceptor, browser, mut rx) = setup(MockBrowser {
        fail_attach: true,
        ..MockBrowser::with_tabs(&["1"])
    });

    let result = interceptor.start(None).await;

    assert!(matches!(result, Err(CaptureError::Attach(_))));
    assert_idle_and_detached(&interceptor);
    assert_eq!(browser.count("reload"), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_reload_failure_detaches() {
    let (interceptor, browser, _rx) = setup(MockBrowser {
        fail_reload: true,
        ..MockBrowser::with_tabs(&["1"])
    });

    let result = interceptor.start(None).await;

    assert!(matches!(result, Err(CaptureError::Reload(_))));
    assert_idle_and_detached(&interceptor);
    assert_eq!(browser.count("detach"), 1);
}

#[tokio::test]
async fn test_target_closed_fails_capture() {
    let (interceptor, _browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    interceptor.start(None).await.unwrap();

    interceptor
        .handle_event(HostEvent::TargetClosed {
            target: TargetId::new("1"),
        })
        .await;

    let error = expect_error(rx.recv().await.unwrap());
    assert_eq!(error, CaptureError::TargetClosed.user_message());
    assert_idle_and_detached(&interceptor);
}

#[tokio::test]
async fn test_closing_unrelated_tab_is_ignored() {
    let (interceptor, _browser, mut rx) = setup(MockBrowser::with_tabs(&["1", "2"]));
    interceptor.start(Some(TargetId::new("1"))).await.unwrap();

    interceptor
        .handle_event(HostEvent::TargetClosed {
            target: TargetId::new("2"),
        })
        .await;

    assert!(interceptor.session().is_active());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_restart_after_completion() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("req-1", &commits_body());

    interceptor.start(None).await.unwrap();
    interceptor.handle_event(response("1", "req-1", ENDPOINT)).await;
    rx.recv().await.unwrap();

    assert!(interceptor.start(None).await.is_ok());
    assert!(interceptor.session().is_active());
}

#[tokio::test]
async fn test_invalid_ticket_pattern_keeps_formatter_state() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("req-1", &commits_body());

    assert!(interceptor.set_ticket_regex("/[A-Z+-\\d+/").is_err());

    interceptor.start(None).await.unwrap();
    interceptor.handle_event(response("1", "req-1", ENDPOINT)).await;

    match rx.recv().await.unwrap() {
        MessagePayload::Success { data, .. } => assert_eq!(data.messages[0].key, "DEV-12"),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_custom_clean_pattern_applies() {
    let (interceptor, browser, mut rx) = setup(MockBrowser::with_tabs(&["1"]));
    browser.serve("req-1", &commits_body());
    interceptor.set_clean_regex(r"^feat:\s*").unwrap();

    interceptor.start(None).await.unwrap();
    interceptor.handle_event(response("1", "req-1", ENDPOINT)).await;

    match rx.recv().await.unwrap() {
        MessagePayload::Success { data, .. } => {
            let texts: Vec<_> = data.messages.iter().map(|m| m.text.as_str()).collect();
            assert_eq!(texts, vec!["fix: login bug", "add export"]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_close_during_attach_leaves_target_detached() {
    let gate = Arc::new(Notify::new());
    let (interceptor, browser, mut rx) = setup(MockBrowser {
        attach_gate: Some(gate.clone()),
        ..MockBrowser::with_tabs(&["1"])
    });

    let starting = tokio::spawn({
        let interceptor = interceptor.clone();
        async move { interceptor.start(None).await }
    });
    while browser.count("attach") == 0 {
        tokio::task::yield_now().await;
    }

    interceptor
        .handle_event(HostEvent::TargetClosed {
            target: TargetId::new("1"),
        })
        .await;
    gate.notify_one();

    let result = starting.await.unwrap();
    assert!(matches!(result, Err(CaptureError::Interrupted)));

    let error = expect_error(rx.recv().await.unwrap());
    assert_eq!(error, CaptureError::TargetClosed.user_message());
    assert!(rx.try_recv().is_err());

    assert_idle_and_detached(&interceptor);
    assert_eq!(browser.count("reload"), 0);
    assert_eq!(browser.count("detach"), 1);
}
