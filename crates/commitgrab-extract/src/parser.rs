//! GitLab commit-list scraper.
//!
//! The commit list endpoint answers with `{ "html": "<li class=\"commit ...\">" }`.
//! Each commit is a self-contained `<li>` block; every field inside it is
//! pulled out with its own pattern. GitLab changed the markup of most fields
//! at least once, so each field carries an ordered list of variants and the
//! first variant producing a non-empty capture wins.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::error::ExtractError;
use crate::types::{CommitRecord, CommitsPayload};

// In COMMIT_BLOCK, MESSAGE and DESCRIPTION the later variant is a subset of
// the first; it names the newer markup explicitly.
static COMMIT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"<li class="commit flex-row[^>]*>[\s\S]*?</li>"#,
        r#"|<li class="commit flex-row js-toggle-container"[\s\S]*?</li>"#,
    ))
    .expect("commit block pattern")
});

static MESSAGE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_variants(&[
        r#"<a class="commit-row-message item-title[^>]*>([^<]+)</a>"#,
        r#"<a class="commit-row-message item-title js-onboarding-commit-item[^>]*>([^<]+)</a>"#,
    ])
});

static DESCRIPTION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_variants(&[
        r#"<pre class="commit-row-description[^>]*>([^<]+)</pre>"#,
        r#"<pre class="commit-row-description gl-whitespace-pre-wrap[^>]*>([^<]+)</pre>"#,
    ])
});

static DATE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_variants(&[r#"<time[^>]*datetime="([^"]+)""#]));

static AUTHOR: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_variants(&[r#"<a class="commit-author-link[^>]*>([^<]+)</a>"#]));

static SHA: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_variants(&[
        r#"<div class="label label-monospace[^>]*>([^<]+)</div>"#,
        r#"<span class="gl-button-text gl-font-monospace">\s*([^<\s]+)\s*</span>"#,
    ])
});

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[#\w]+;").expect("entity pattern"));

fn compile_variants(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("field pattern"))
        .collect()
}

/// Extract every valid commit from the payload, in document order.
///
/// Blocks missing a message, date, author or sha are skipped silently.
pub fn parse_commits(payload: &CommitsPayload) -> Vec<CommitRecord> {
    let mut commits = Vec::new();
    let mut skipped = 0usize;

    for block in COMMIT_BLOCK.find_iter(&payload.html) {
        match parse_block(block.as_str()) {
            Some(commit) => commits.push(commit),
            None => skipped += 1,
        }
    }

    debug!(found = commits.len(), skipped, "Parsed commit blocks");
    commits
}

/// Decode a raw `commits.json` body and extract its commits.
///
/// Fails when the body is not the expected JSON envelope or yields no
/// commits at all.
pub fn parse_response_body(body: &str) -> Result<Vec<CommitRecord>, ExtractError> {
    let payload: CommitsPayload = serde_json::from_str(body)?;
    let commits = parse_commits(&payload);
    if commits.is_empty() {
        return Err(ExtractError::NoCommits);
    }
    Ok(commits)
}

fn parse_block(html: &str) -> Option<CommitRecord> {
    let message = first_capture(&MESSAGE, html)?;
    let date = first_capture(&DATE, html)?;
    let author = first_capture(&AUTHOR, html)?;
    let sha = first_capture(&SHA, html)?;
    let description = first_capture(&DESCRIPTION, html).map(|d| decode_html_entities(&d));

    trace!(%sha, %message, "Parsed commit block");

    Some(CommitRecord {
        message,
        description,
        date,
        author,
        sha,
    })
}

/// First non-empty, trimmed capture across the variants.
fn first_capture(variants: &[Regex], html: &str) -> Option<String> {
    variants.iter().find_map(|re| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Decode the handful of entities GitLab emits in commit descriptions.
///
/// Unknown entities are left untouched.
pub fn decode_html_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[0];
            match entity {
                "&#x000A;" => "\n".to_string(),
                "&quot;" => "\"".to_string(),
                "&amp;" => "&".to_string(),
                "&lt;" => "<".to_string(),
                "&gt;" => ">".to_string(),
                "&#39;" => "'".to_string(),
                "&nbsp;" => " ".to_string(),
                _ => entity.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
