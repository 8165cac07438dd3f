//! GitHub-flavored markdown to Slack mrkdwn conversion.
//!
//! Slack's mrkdwn dialect is close to but not the same as GitHub's:
//! bold is `*text*` instead of `**text**`, strikethrough is `~text~`,
//! and links are `<url|text>`. The conversion is a fixed set of textual
//! substitutions rather than a markdown parser, which matches what the
//! message renderer needs and keeps the behavior predictable.

use std::sync::LazyLock;

use regex::Regex;

/// Hard cap applied after conversion; Slack truncates section text around
/// 3000 characters, so we cut earlier and mark the cut.
pub const MAX_TEXT_LEN: usize = 2800;

const TRUNCATION_MARKER: &str = "…";

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~([^~]+)~~").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid regex"));

/// Convert a GitHub-markdown snippet to Slack mrkdwn.
///
/// Inline code, fenced blocks, and `_italic_` pass through unchanged;
/// those syntaxes are shared between the two dialects. Output longer than
/// [`MAX_TEXT_LEN`] is truncated on a char boundary with a marker.
pub fn to_mrkdwn(input: &str) -> String {
    // Links first, so the other passes never rewrite URL contents.
    let text = LINK.replace_all(input, "<$2|$1>");
    let text = BOLD.replace_all(&text, "*$1*");
    let text = STRIKETHROUGH.replace_all(&text, "~$1~");

    truncate(&text, MAX_TEXT_LEN)
}

/// Truncate to at most `max` characters, appending a marker if cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}{TRUNCATION_MARKER}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
