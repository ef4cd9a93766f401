//! Ticket-keyed commit message formatting.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

use crate::error::PatternError;
use crate::pattern::{compile_pattern, DEFAULT_CLEAN_PATTERN, DEFAULT_TICKET_PATTERN};
use crate::types::{CommitRecord, FormattedCommits, FormattedMessage};

/// A compiled pattern together with the text it was compiled from.
#[derive(Debug, Clone)]
struct ActivePattern {
    source: String,
    regex: Regex,
}

impl ActivePattern {
    fn compile(source: &str) -> Result<Self, PatternError> {
        Ok(Self {
            source: source.trim().to_string(),
            regex: compile_pattern(source)?,
        })
    }

    fn default_for(source: &'static str) -> Self {
        Self {
            source: source.to_string(),
            regex: compile_pattern(source).expect("built-in pattern compiles"),
        }
    }
}

/// Derives ticket keys, strips commit prefixes and renders key summaries.
///
/// The formatter only ever holds compiled patterns: setters compile first and
/// leave the current pattern untouched on failure.
#[derive(Debug, Clone)]
pub struct CommitMessageFormatter {
    ticket: ActivePattern,
    clean: ActivePattern,
}

impl Default for CommitMessageFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitMessageFormatter {
    /// Formatter using the built-in ticket and clean patterns.
    pub fn new() -> Self {
        Self {
            ticket: ActivePattern::default_for(DEFAULT_TICKET_PATTERN),
            clean: ActivePattern::default_for(DEFAULT_CLEAN_PATTERN),
        }
    }

    /// Build from persisted pattern strings.
    ///
    /// Absent, blank or invalid strings fall back to the built-in default.
    pub fn from_stored(ticket: Option<&str>, clean: Option<&str>) -> Self {
        let mut formatter = Self::new();
        if let Some(raw) = ticket.filter(|s| !s.trim().is_empty()) {
            if let Err(e) = formatter.set_ticket_regex(raw) {
                warn!("Stored ticket pattern rejected, using default: {}", e);
            }
        }
        if let Some(raw) = clean.filter(|s| !s.trim().is_empty()) {
            if let Err(e) = formatter.set_clean_regex(raw) {
                warn!("Stored clean pattern rejected, using default: {}", e);
            }
        }
        formatter
    }

    /// Replace the ticket pattern. On error the previous pattern stays active.
    pub fn set_ticket_regex(&mut self, raw: &str) -> Result<(), PatternError> {
        self.ticket = ActivePattern::compile(raw)?;
        Ok(())
    }

    /// Replace the clean pattern. On error the previous pattern stays active.
    pub fn set_clean_regex(&mut self, raw: &str) -> Result<(), PatternError> {
        self.clean = ActivePattern::compile(raw)?;
        Ok(())
    }

    pub fn ticket_pattern(&self) -> &str {
        &self.ticket.source
    }

    pub fn clean_pattern(&self) -> &str {
        &self.clean.source
    }

    /// Ticket key from the description, then the message, else empty.
    pub fn extract_key(&self, commit: &CommitRecord) -> String {
        commit
            .description
            .as_deref()
            .and_then(|d| self.ticket.regex.find(d))
            .or_else(|| self.ticket.regex.find(&commit.message))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Strip a leading clean-pattern match and trim.
    pub fn clean_message(&self, message: &str) -> String {
        match self.clean.regex.find(message) {
            Some(m) if m.start() == 0 => message[m.end()..].trim().to_string(),
            _ => message.trim().to_string(),
        }
    }

    /// Key, clean and sort the commits.
    ///
    /// Keyed entries come first in ascending key order, unkeyed entries last;
    /// equal keys keep their input order.
    pub fn format(&self, commits: &[CommitRecord]) -> FormattedCommits {
        let mut messages: Vec<FormattedMessage> = commits
            .iter()
            .map(|commit| FormattedMessage {
                key: self.extract_key(commit),
                text: self.clean_message(&commit.message),
            })
            .collect();

        // `sort_by` is stable
        messages.sort_by(|a, b| compare_keys(&a.key, &b.key));

        FormattedCommits { messages }
    }

    /// Group keyed messages by ticket type, e.g. `DEV_3,12 / QA_2,5`.
    ///
    /// Groups appear in first-occurrence order of `messages`; numbers within
    /// a group ascend numerically, repeats included. Unkeyed messages are
    /// excluded, so an all-unkeyed input yields an empty string.
    pub fn generate_key_summary(messages: &[FormattedMessage]) -> String {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for message in messages.iter().filter(|m| m.has_key()) {
            let (ticket_type, number) = split_key(&message.key);
            let slot = *index.entry(ticket_type.to_string()).or_insert_with(|| {
                groups.push((ticket_type.to_string(), Vec::new()));
                groups.len() - 1
            });
            if !number.is_empty() {
                groups[slot].1.push(number.to_string());
            }
        }

        groups
            .into_iter()
            .map(|(ticket_type, mut numbers)| {
                numbers.sort_by(|a, b| compare_numbers(a, b));
                if numbers.is_empty() {
                    ticket_type
                } else {
                    format!("{}_{}", ticket_type, numbers.join(","))
                }
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

/// Numeric ascending; non-numeric remainders sort after, lexicographically.
fn compare_numbers(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// `DEV-12` -> (`DEV`, `12`). A key without separator is all type.
fn split_key(key: &str) -> (&str, &str) {
    let is_sep = |c: char| c == '-' || c == '_';
    match key.find(is_sep) {
        Some(pos) => {
            let rest = &key[pos + 1..];
            let number = rest.split(is_sep).next().unwrap_or("");
            (&key[..pos], number)
        }
        None => (key, ""),
    }
}

#[cfg(test)]
#[path = "formatter_tests.rs"]
mod tests;
