//! Pure message renderers.
//!
//! Two entry points: [`render_event`] formats a single webhook event for
//! a real-time notification, [`render_digest`] formats categorized PR
//! buckets for a scheduled digest. Neither touches I/O; both are
//! deterministic for a given input, which is what makes the rendered
//! payload snapshot stored on the notification row reproducible.

use gitpulse_core::categorize::{DigestBuckets, PrView};
use gitpulse_core::event::{EventKind, WebhookEnvelope};
use gitpulse_core::markdown;

use crate::blocks::{Attachment, Block, Message};

/// Maximum list entries rendered per bucket before eliding.
const MAX_LIST_ITEMS: usize = 5;

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

/// Attachment side-bar color for a PR/issue action.
fn action_color(action: &str) -> &'static str {
    match action {
        "opened" | "reopened" => "#2da44e",
        "closed" => "#cf222e",
        "ready_for_review" => "#0969da",
        "review_requested" => "#bf8700",
        "assigned" | "unassigned" => "#6e7781",
        _ => "#57606a",
    }
}

/// Attachment side-bar color for a review state.
fn review_color(state: &str) -> &'static str {
    match state {
        "approved" => "#2da44e",
        "changes_requested" => "#cf222e",
        _ => "#57606a",
    }
}

/// Leading emoji for a PR/issue action.
fn action_icon(action: &str) -> &'static str {
    match action {
        "opened" | "reopened" => ":large_green_circle:",
        "closed" => ":red_circle:",
        "ready_for_review" => ":eyes:",
        "review_requested" => ":mag:",
        "assigned" => ":bust_in_silhouette:",
        "unassigned" => ":dash:",
        _ => ":bell:",
    }
}

/// Leading emoji for a review state.
fn review_icon(state: &str) -> &'static str {
    match state {
        "approved" => ":white_check_mark:",
        "changes_requested" => ":x:",
        _ => ":speech_balloon:",
    }
}

// ---------------------------------------------------------------------------
// Event rendering
// ---------------------------------------------------------------------------

/// Render a single webhook event into a notification message.
pub fn render_event(envelope: &WebhookEnvelope) -> Message {
    let repo = envelope
        .repository
        .as_ref()
        .map(|r| r.full_name.as_str())
        .unwrap_or("unknown repository");
    let actor = envelope.sender_login().unwrap_or("someone");

    let (headline, body, color) = match envelope.kind {
        EventKind::PullRequest => {
            let title = payload_str(envelope, &["pull_request", "title"]);
            let url = payload_str(envelope, &["pull_request", "html_url"]);
            let number = payload_i64(envelope, &["pull_request", "number"]);
            (
                format!(
                    "{} {} pull request #{} in {}",
                    action_icon(&envelope.action),
                    verb_phrase(actor, &envelope.action),
                    number.unwrap_or_default(),
                    repo
                ),
                linked_title(title, url),
                action_color(&envelope.action),
            )
        }
        EventKind::PullRequestReview => {
            let state = payload_str(envelope, &["review", "state"]).unwrap_or_default();
            let url = payload_str(envelope, &["review", "html_url"]);
            let number = payload_i64(envelope, &["pull_request", "number"]);
            (
                format!(
                    "{} {} {} pull request #{} in {}",
                    review_icon(&state),
                    actor,
                    review_verb(&state),
                    number.unwrap_or_default(),
                    repo
                ),
                linked_title(payload_str(envelope, &["pull_request", "title"]), url),
                review_color(&state),
            )
        }
        EventKind::PullRequestReviewComment | EventKind::IssueComment => {
            let body = payload_str(envelope, &["comment", "body"]).unwrap_or_default();
            let url = payload_str(envelope, &["comment", "html_url"]);
            (
                format!(":speech_balloon: {actor} commented in {repo}"),
                linked_title(Some(markdown::to_mrkdwn(&body)), url),
                "#57606a",
            )
        }
        EventKind::Issues => {
            let title = payload_str(envelope, &["issue", "title"]);
            let url = payload_str(envelope, &["issue", "html_url"]);
            let number = payload_i64(envelope, &["issue", "number"]);
            (
                format!(
                    "{} {} issue #{} in {}",
                    action_icon(&envelope.action),
                    verb_phrase(actor, &envelope.action),
                    number.unwrap_or_default(),
                    repo
                ),
                linked_title(title, url),
                action_color(&envelope.action),
            )
        }
        // Kinds outside the notification path never reach the renderer,
        // but formatting them anyway keeps this function total.
        _ => (
            format!(":bell: {} event from {} in {}", envelope.kind.as_wire(), actor, repo),
            None,
            "#57606a",
        ),
    };

    let mut message = Message::new(headline.clone());
    let mut blocks = vec![Block::section(headline)];
    if let Some(body) = body {
        blocks.push(Block::section(body));
    }
    blocks.push(Block::context(format!("{repo} · via GitPulse")));

    message.push_attachment(Attachment {
        color: color.to_string(),
        blocks,
    });
    message
}

/// `alice opened`, `alice was assigned to`, ...
fn verb_phrase(actor: &str, action: &str) -> String {
    match action {
        "review_requested" => format!("{actor} requested review on"),
        "assigned" => format!("{actor} was assigned to"),
        "unassigned" => format!("{actor} was unassigned from"),
        "ready_for_review" => format!("{actor} marked ready for review"),
        other => format!("{actor} {other}"),
    }
}

fn review_verb(state: &str) -> &'static str {
    match state {
        "approved" => "approved",
        "changes_requested" => "requested changes on",
        _ => "reviewed",
    }
}

fn linked_title(title: Option<String>, url: Option<String>) -> Option<String> {
    let title = title?;
    Some(match url {
        Some(url) => format!("<{url}|{}>", markdown::truncate(&title, 200)),
        None => markdown::truncate(&title, 200),
    })
}

fn payload_str(envelope: &WebhookEnvelope, path: &[&str]) -> Option<String> {
    let mut value = &envelope.payload;
    for key in path {
        value = value.get(key)?;
    }
    value.as_str().map(String::from)
}

fn payload_i64(envelope: &WebhookEnvelope, path: &[&str]) -> Option<i64> {
    let mut value = &envelope.payload;
    for key in path {
        value = value.get(key)?;
    }
    value.as_i64()
}

// ---------------------------------------------------------------------------
// Digest rendering
// ---------------------------------------------------------------------------

/// Render categorized buckets into a digest message.
///
/// `team_name` is shown in the header for team-scope configs.
pub fn render_digest(
    buckets: &DigestBuckets,
    config_name: &str,
    team_name: Option<&str>,
) -> Message {
    let header = match team_name {
        Some(team) => format!("{config_name} — team {team}"),
        None => config_name.to_string(),
    };
    let fallback = format!("{header}: {} open pull requests", buckets.total());

    let mut message = Message::new(fallback);
    message.push_block(Block::header(header));
    message.push_block(Block::context(format!(
        "{} pull requests across {} sections",
        buckets.total(),
        section_count(buckets)
    )));

    push_bucket(
        &mut message,
        ":mag: Waiting on your review",
        &buckets.waiting_on_user,
        "#bf8700",
    );
    push_bucket(
        &mut message,
        ":white_check_mark: Approved and ready to merge",
        &buckets.approved_ready_to_merge,
        "#2da44e",
    );
    push_bucket(
        &mut message,
        ":large_green_circle: Open pull requests",
        &buckets.user_open_prs,
        "#0969da",
    );
    push_bucket(
        &mut message,
        ":construction: Drafts",
        &buckets.user_draft_prs,
        "#6e7781",
    );

    message
}

fn section_count(buckets: &DigestBuckets) -> usize {
    [
        !buckets.waiting_on_user.is_empty(),
        !buckets.approved_ready_to_merge.is_empty(),
        !buckets.user_open_prs.is_empty(),
        !buckets.user_draft_prs.is_empty(),
    ]
    .iter()
    .filter(|present| **present)
    .count()
}

/// Append one bucket as a colored attachment; empty buckets are omitted.
fn push_bucket(message: &mut Message, title: &str, prs: &[PrView], color: &str) {
    if prs.is_empty() {
        return;
    }

    let mut blocks = vec![Block::section(format!("*{title}* ({})", prs.len()))];
    for pr in prs.iter().take(MAX_LIST_ITEMS) {
        blocks.push(Block::section(format!(
            "<{}|#{} {}> — {}",
            pr.url,
            pr.number,
            markdown::truncate(&pr.title, 120),
            pr.author
        )));
    }
    if prs.len() > MAX_LIST_ITEMS {
        blocks.push(Block::context(format!(
            "...and {} more",
            prs.len() - MAX_LIST_ITEMS
        )));
    }
    blocks.push(Block::divider());

    message.push_attachment(Attachment {
        color: color.to_string(),
        blocks,
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
