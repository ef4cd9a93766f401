//! Pattern strings as users type them.
//!
//! Patterns are stored either bare (`[A-Z]+-\d+`) or slash-delimited with
//! trailing flags (`/^fix:\s*/i`). Only flags that change matching are
//! honoured; `g`, `u` and `y` are accepted for compatibility and ignored since
//! every use here is a single first-match lookup.

use regex::{Regex, RegexBuilder};

use crate::error::PatternError;

/// Default ticket pattern, e.g. `DEV-12` or `QA_5`.
pub const DEFAULT_TICKET_PATTERN: &str = r"/[A-Z]+[-_]\d+/";

/// Default conventional-commit prefix pattern.
pub const DEFAULT_CLEAN_PATTERN: &str =
    r"/^(feat|fix|refactor|chore|docs|style|test|perf)(\([^)]*\))?!?:\s*/i";

/// Compile a bare or slash-delimited pattern string.
pub fn compile_pattern(raw: &str) -> Result<Regex, PatternError> {
    let raw = raw.trim();
    let (body, flags) = split_delimited(raw);

    if body.is_empty() {
        return Err(PatternError::new(raw, "pattern is empty"));
    }

    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'g' | 'u' | 'y' => {}
            other => {
                return Err(PatternError::new(raw, format!("unsupported flag '{}'", other)));
            }
        }
    }

    builder
        .build()
        .map_err(|e| PatternError::new(raw, e.to_string()))
}

/// Check that a pattern string compiles without keeping the result.
pub fn validate_pattern(raw: &str) -> Result<(), PatternError> {
    compile_pattern(raw).map(|_| ())
}

/// Split `/body/flags` into its parts. Anything else is a bare body.
fn split_delimited(raw: &str) -> (&str, &str) {
    if let Some(rest) = raw.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let flags = &rest[end + 1..];
            if flags.chars().all(|c| c.is_ascii_alphabetic()) {
                return (&rest[..end], flags);
            }
        }
    }
    (raw, "")
}
