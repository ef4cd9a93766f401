//! Capture, tab listing and offline parsing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use commitgrab_config::{Config, PopupState, StateStore};
use commitgrab_extract::{parse_response_body, ClipboardExport, CommitMessageFormatter};
use commitgrab_interceptor::cdp::CdpHost;
use commitgrab_interceptor::{
    Interceptor, InterceptorConfig, MessageDispatcher, MessagePayload, StartRequest,
    StartResponse, TargetId,
};

use crate::cli::OutputFormat;

/// Build the formatter from config patterns, falling back to stored ones.
pub(crate) fn effective_formatter(config: &Config, state: &PopupState) -> CommitMessageFormatter {
    let ticket = config
        .patterns
        .ticket
        .as_deref()
        .unwrap_or(&state.ticket_regex);
    let clean = config.patterns.clean.as_deref().unwrap_or(&state.clean_regex);
    CommitMessageFormatter::from_stored(Some(ticket), Some(clean))
}

/// Run one capture against the browser and print the result.
pub(crate) async fn capture(
    mut config: Config,
    tab: Option<String>,
    endpoint: Option<String>,
    format: OutputFormat,
    timeout_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(endpoint) = endpoint {
        config.browser.endpoint = endpoint;
    }
    if let Some(timeout_ms) = timeout_ms {
        config.capture.timeout_ms = timeout_ms;
    }

    let store = StateStore::new(&config.storage.state_file);
    let mut state = store.load()?;
    let formatter = effective_formatter(&config, &state);

    let (host, events) = CdpHost::connect(&config.browser.endpoint).await?;
    let host = Arc::new(host);
    let (dispatcher, mut results) = MessageDispatcher::channel();

    let interceptor = Interceptor::new(
        InterceptorConfig {
            url_filter: config.capture.url_filter.clone(),
            timeout: Duration::from_millis(config.capture.timeout_ms),
        },
        host.clone(),
        host,
        formatter,
        dispatcher,
    );
    tokio::spawn(interceptor.clone().run(events));

    let request = StartRequest::new(tab.map(TargetId::new));
    if let StartResponse::Error { message } = interceptor.handle_request(request).await {
        return Err(message.into());
    }

    let payload = results.recv().await.ok_or("capture ended without a result")?;

    match &payload {
        MessagePayload::Success { data, .. } => {
            info!(count = data.messages.len(), "Captured commit messages");
            state.record_capture(data.messages.clone());
            if let Err(e) = store.save(&state) {
                warn!("Failed to save state to {}: {}", store.path().display(), e);
            }
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&payload)?),
                OutputFormat::Text => println!("{}", state.to_export().to_clipboard_text()),
            }
            Ok(())
        }
        MessagePayload::Error { error, .. } => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            Err(error
                .clone()
                .unwrap_or_else(|| "capture failed".to_string())
                .into())
        }
    }
}

/// List page tabs on the debugging endpoint.
pub(crate) async fn tabs(
    config: &Config,
    endpoint: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = endpoint.unwrap_or_else(|| config.browser.endpoint.clone());
    let (host, _events) = CdpHost::connect(&endpoint).await?;
    let tabs = host.list_tabs().await?;

    if tabs.is_empty() {
        println!("No tabs found.");
        return Ok(());
    }

    println!("{:<34} {:<30} {}", "ID", "TITLE", "URL");
    println!("{}", "-".repeat(100));
    for tab in tabs {
        let title: String = tab.title.chars().take(28).collect();
        println!("{:<34} {:<30} {}", tab.id, title, tab.url);
    }
    Ok(())
}

/// Parse a saved response body without a browser.
pub(crate) fn parse(
    config: &Config,
    file: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = std::fs::read_to_string(file)?;
    let state = StateStore::new(&config.storage.state_file).load()?;
    let formatter = effective_formatter(config, &state);

    let commits = parse_response_body(&body)?;
    let formatted = formatter.format(&commits);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&formatted)?),
        OutputFormat::Text => {
            let export = ClipboardExport::from_messages(formatted.messages);
            println!("{}", export.to_clipboard_text());
        }
    }
    Ok(())
}
