//! # commitgrab extract
//!
//! Turns a captured GitLab commit-list payload into curated, ticket-keyed
//! commit messages.
//!
//! The pipeline has two pure stages:
//!
//! 1. [`parse_commits`] scans the HTML fragment embedded in the JSON body and
//!    yields one [`CommitRecord`] per well-formed commit block.
//! 2. [`CommitMessageFormatter`] derives a ticket key for every commit,
//!    strips conventional-commit prefixes, sorts the result and renders the
//!    grouped key summary.
//!
//! ```rust,ignore
//! let commits = parse_response_body(&body)?;
//! let formatter = CommitMessageFormatter::new();
//! let formatted = formatter.format(&commits);
//! let summary = CommitMessageFormatter::generate_key_summary(&formatted.messages);
//! ```

mod error;
mod export;
mod formatter;
mod parser;
mod pattern;
mod types;

pub use error::{ExtractError, PatternError};
pub use export::{render_lines, ClipboardExport, ExportItem};
pub use formatter::CommitMessageFormatter;
pub use parser::{decode_html_entities, parse_commits, parse_response_body};
pub use pattern::{
    compile_pattern, validate_pattern, DEFAULT_CLEAN_PATTERN, DEFAULT_TICKET_PATTERN,
};
pub use types::{CommitRecord, CommitsPayload, FormattedCommits, FormattedMessage};
