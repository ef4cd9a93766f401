use super::*;

fn block(message: &str, description: Option<&str>, sha: &str) -> String {
    let description = description
        .map(|d| format!(r#"<pre class="commit-row-description gl-mb-3">{}</pre>"#, d))
        .unwrap_or_default();
    format!(
        r#"<li class="commit flex-row js-toggle-container" id="commit-{sha}">
<div class="commit-detail">
<a class="commit-row-message item-title js-onboarding-commit-item " href="/c/{sha}">{message}</a>
{description}
<a class="commit-author-link js-user-link" href="/u/jane"> Jane Doe </a>
authored <time class="js-timeago" datetime="2024-05-01T10:00:00Z">May 1</time>
</div>
<div class="label label-monospace monospace">{sha}</div>
</li>"#
    )
}

fn payload(blocks: &[String]) -> CommitsPayload {
    CommitsPayload {
        html: blocks.join("\n"),
    }
}

#[test]
fn test_parse_single_commit() {
    let commits = parse_commits(&payload(&[block("fix: login", Some("Fixes DEV-12"), "a1b2c3d4")]));

    assert_eq!(commits.len(), 1);
    let commit = &commits[0];
    assert_eq!(commit.message, "fix: login");
    assert_eq!(commit.description.as_deref(), Some("Fixes DEV-12"));
    assert_eq!(commit.date, "2024-05-01T10:00:00Z");
    assert_eq!(commit.author, "Jane Doe");
    assert_eq!(commit.sha, "a1b2c3d4");
}

#[test]
fn test_parse_preserves_document_order() {
    let commits = parse_commits(&payload(&[
        block("second", None, "bbbb"),
        block("first", None, "aaaa"),
        block("third", None, "cccc"),
    ]));

    let shas: Vec<_> = commits.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(shas, vec!["bbbb", "aaaa", "cccc"]);
}

#[test]
fn test_missing_description_is_none() {
    let commits = parse_commits(&payload(&[block("feat: export", None, "abcd")]));
    assert_eq!(commits[0].description, None);
}

#[test]
fn test_invalid_blocks_are_dropped() {
    let no_sha = r#"<li class="commit flex-row">
<a class="commit-row-message item-title">no sha here</a>
<a class="commit-author-link">Jane</a>
<time datetime="2024-05-01T10:00:00Z"></time>
</li>"#
        .to_string();
    let blank_message = block("   ", None, "ffff");

    let commits = parse_commits(&payload(&[
        block("kept one", None, "1111"),
        no_sha,
        blank_message,
        block("kept two", None, "2222"),
    ]));

    // 4 blocks, 2 invalid
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].message, "kept one");
    assert_eq!(commits[1].message, "kept two");
}

#[test]
fn test_unterminated_block_not_found() {
    let mut html = block("complete", None, "1111");
    html.push_str(r#"<li class="commit flex-row"><a class="commit-row-message item-title">dangling</a>"#);

    let commits = parse_commits(&CommitsPayload { html });
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].message, "complete");
}

#[test]
fn test_span_sha_variant() {
    let html = r#"<li class="commit flex-row">
<a class="commit-row-message item-title">newer markup</a>
<a class="commit-author-link">Kim</a>
<time datetime="2024-06-01T00:00:00Z"></time>
<span class="gl-button-text gl-font-monospace">
  9f8e7d6c
</span>
</li>"#;

    let commits = parse_commits(&CommitsPayload {
        html: html.to_string(),
    });
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].sha, "9f8e7d6c");
}

#[test]
fn test_description_entities_decoded() {
    let commits = parse_commits(&payload(&[block(
        "chore: bump",
        Some("a &amp; b&#x000A;&quot;q&quot; &lt;x&gt; it&#39;s&nbsp;ok &copy;"),
        "abcd",
    )]));

    assert_eq!(
        commits[0].description.as_deref(),
        Some("a & b\n\"q\" <x> it's ok &copy;")
    );
}

#[test]
fn test_message_is_not_entity_decoded() {
    let commits = parse_commits(&payload(&[block("fix: a &amp; b", None, "abcd")]));
    assert_eq!(commits[0].message, "fix: a &amp; b");
}

#[test]
fn test_decode_unknown_entity_passthrough() {
    assert_eq!(decode_html_entities("&hellip; &#x1F600;"), "&hellip; &#x1F600;");
}

#[test]
fn test_parse_is_repeatable() {
    let input = payload(&[block("one", Some("DEV-1"), "1111"), block("two", None, "2222")]);
    assert_eq!(parse_commits(&input), parse_commits(&input));
}

#[test]
fn test_parse_response_body() {
    let html = block("fix: login", None, "abcd");
    let body = serde_json::json!({ "html": html, "count": 1 }).to_string();

    let commits = parse_response_body(&body).unwrap();
    assert_eq!(commits.len(), 1);
}

#[test]
fn test_parse_response_body_not_json() {
    let result = parse_response_body("<html>not json</html>");
    assert!(matches!(result, Err(ExtractError::InvalidPayload(_))));
}

#[test]
fn test_parse_response_body_without_commits() {
    let body = serde_json::json!({ "html": "<ul></ul>" }).to_string();
    assert!(matches!(parse_response_body(&body), Err(ExtractError::NoCommits)));
}

#[test]
fn test_plain_and_newer_markup_both_parse() {
    let plain = r#"<li class="commit flex-row">
<a class="commit-row-message item-title" href="/c/1">chore: bump deps</a>
<pre class="commit-row-description">OPS-4</pre>
<a class="commit-author-link" href="/u/lee">Lee</a>
<time datetime="2024-04-02T09:00:00Z"></time>
<div class="label label-monospace">1111aaaa</div>
</li>"#;
    let newer = r#"<li class="commit flex-row js-toggle-container" id="commit-2">
<a class="commit-row-message item-title js-onboarding-commit-item gl-text-truncate" href="/c/2">fix: race</a>
<pre class="commit-row-description gl-whitespace-pre-wrap gl-mb-3">DEV-9 &amp; QA-1</pre>
<a class="commit-author-link js-user-link" href="/u/ana">Ana</a>
<time class="js-timeago" datetime="2024-04-03T09:00:00Z">Apr 3</time>
<span class="gl-button-text gl-font-monospace"> 2222bbbb </span>
</li>"#;

    let commits = parse_commits(&payload(&[plain.to_string(), newer.to_string()]));

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].message, "chore: bump deps");
    assert_eq!(commits[0].description.as_deref(), Some("OPS-4"));
    assert_eq!(commits[0].sha, "1111aaaa");
    assert_eq!(commits[1].message, "fix: race");
    assert_eq!(commits[1].description.as_deref(), Some("DEV-9 & QA-1"));
    assert_eq!(commits[1].sha, "2222bbbb");
}
