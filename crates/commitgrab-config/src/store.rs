//! Persisted curation state.
//!
//! A single JSON document holding the last captured message list, its
//! summary, and the user's pattern settings. Field names follow the popup's
//! storage layout so either side can read the other's file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use commitgrab_extract::{
    validate_pattern, ClipboardExport, ExportItem, FormattedMessage, PatternError,
    DEFAULT_CLEAN_PATTERN, DEFAULT_TICKET_PATTERN,
};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupState {
    #[serde(default)]
    pub messages: Vec<ExportItem>,

    #[serde(default)]
    pub summary: String,

    #[serde(default = "default_summary_checked")]
    pub summary_checked: bool,

    #[serde(default)]
    pub ticket_regex: String,

    #[serde(default)]
    pub clean_regex: String,
}

fn default_summary_checked() -> bool {
    true
}

impl Default for PopupState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            summary: String::new(),
            summary_checked: true,
            ticket_regex: DEFAULT_TICKET_PATTERN.to_string(),
            clean_regex: DEFAULT_CLEAN_PATTERN.to_string(),
        }
    }
}

impl PopupState {
    /// Replace the ticket pattern if it compiles.
    pub fn set_ticket_regex(&mut self, raw: &str) -> Result<(), PatternError> {
        validate_pattern(raw)?;
        self.ticket_regex = raw.trim().to_string();
        Ok(())
    }

    /// Replace the clean pattern if it compiles.
    pub fn set_clean_regex(&mut self, raw: &str) -> Result<(), PatternError> {
        validate_pattern(raw)?;
        self.clean_regex = raw.trim().to_string();
        Ok(())
    }

    /// Store a fresh capture: all messages checked, summary recomputed.
    pub fn record_capture(&mut self, messages: Vec<FormattedMessage>) {
        let export = ClipboardExport::from_messages(messages);
        self.messages = export.items;
        self.summary = export.summary;
        self.summary_checked = true;
    }

    /// The current selection as clipboard export input.
    pub fn to_export(&self) -> ClipboardExport {
        ClipboardExport {
            items: self.messages.clone(),
            summary: self.summary.clone(),
            summary_checked: self.summary_checked,
        }
    }

    fn fill_missing_patterns(&mut self) {
        if self.ticket_regex.trim().is_empty() {
            self.ticket_regex = DEFAULT_TICKET_PATTERN.to_string();
        }
        if self.clean_regex.trim().is_empty() {
            self.clean_regex = DEFAULT_CLEAN_PATTERN.to_string();
        }
    }
}

/// JSON file backing a [`PopupState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, or defaults when the file does not exist yet.
    pub fn load(&self) -> Result<PopupState, ConfigError> {
        if !self.path.exists() {
            debug!("No state file at {}, using defaults", self.path.display());
            return Ok(PopupState::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut state: PopupState = serde_json::from_str(&content)?;
        state.fill_missing_patterns();
        Ok(state)
    }

    pub fn save(&self, state: &PopupState) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)?;
        debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}
