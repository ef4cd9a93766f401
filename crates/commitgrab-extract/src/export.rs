//! Clipboard text rendering.

use serde::{Deserialize, Serialize};

use crate::formatter::CommitMessageFormatter;
use crate::types::FormattedMessage;

/// Render one line per message: `- KEY : text`, or `- text` when unkeyed.
pub fn render_lines(messages: &[FormattedMessage]) -> String {
    messages
        .iter()
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(message: &FormattedMessage) -> String {
    if message.has_key() {
        format!("- {} : {}", message.key, message.text)
    } else {
        format!("- {}", message.text)
    }
}

/// A curated message with its selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportItem {
    pub key: String,
    pub text: String,
    pub checked: bool,
}

impl From<FormattedMessage> for ExportItem {
    fn from(message: FormattedMessage) -> Self {
        Self {
            key: message.key,
            text: message.text,
            checked: true,
        }
    }
}

/// The curated selection that ends up on the clipboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardExport {
    pub items: Vec<ExportItem>,
    pub summary: String,
    pub summary_checked: bool,
}

impl ClipboardExport {
    /// Fresh selection from formatter output: everything checked, summary
    /// computed from the messages.
    pub fn from_messages(messages: Vec<FormattedMessage>) -> Self {
        let summary = CommitMessageFormatter::generate_key_summary(&messages);
        Self {
            items: messages.into_iter().map(ExportItem::from).collect(),
            summary,
            summary_checked: true,
        }
    }

    /// Summary line (when checked and non-empty), a blank line, then the
    /// checked messages in their current order.
    pub fn to_clipboard_text(&self) -> String {
        let selected: Vec<FormattedMessage> = self
            .items
            .iter()
            .filter(|item| item.checked)
            .map(|item| FormattedMessage::new(item.key.clone(), item.text.clone()))
            .collect();
        let lines = render_lines(&selected);

        if self.summary_checked && !self.summary.is_empty() {
            if lines.is_empty() {
                self.summary.clone()
            } else {
                format!("{}\n\n{}", self.summary, lines)
            }
        } else {
            lines
        }
    }
}
