//! Typed webhook event envelope.
//!
//! Inbound deliveries are parsed once, at ingestion, into a
//! [`WebhookEnvelope`] carrying a closed [`EventKind`] variant instead of
//! the wire's free-form type string. Every downstream decision point
//! matches exhaustively on the kind; unsupported kinds are rejected at the
//! parse boundary and never reach the pipeline.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The closed set of webhook event kinds this system understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    Issues,
    IssueComment,
    Push,
    Create,
    Delete,
    Release,
    Star,
    Fork,
    Membership,
    Installation,
}

impl EventKind {
    /// Parse a wire event name (the `X-GitHub-Event` header value).
    ///
    /// Returns `None` for anything outside the supported set.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "pull_request" => Some(Self::PullRequest),
            "pull_request_review" => Some(Self::PullRequestReview),
            "pull_request_review_comment" => Some(Self::PullRequestReviewComment),
            "issues" => Some(Self::Issues),
            "issue_comment" => Some(Self::IssueComment),
            "push" => Some(Self::Push),
            "create" => Some(Self::Create),
            "delete" => Some(Self::Delete),
            "release" => Some(Self::Release),
            "star" => Some(Self::Star),
            "fork" => Some(Self::Fork),
            "membership" => Some(Self::Membership),
            "installation" | "installation_repositories" => Some(Self::Installation),
            _ => None,
        }
    }

    /// The canonical wire name, used for storage and log fields.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::PullRequest => "pull_request",
            Self::PullRequestReview => "pull_request_review",
            Self::PullRequestReviewComment => "pull_request_review_comment",
            Self::Issues => "issues",
            Self::IssueComment => "issue_comment",
            Self::Push => "push",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Release => "release",
            Self::Star => "star",
            Self::Fork => "fork",
            Self::Membership => "membership",
            Self::Installation => "installation",
        }
    }

    /// Preference key consulted by the legacy per-user notification
    /// fallback when no analyzer category maps this kind.
    pub fn preference_key(&self) -> &'static str {
        match self {
            Self::PullRequest => "pull_requests",
            Self::PullRequestReview => "reviews",
            Self::PullRequestReviewComment | Self::IssueComment => "comments",
            Self::Issues => "issues",
            Self::Push | Self::Create | Self::Delete => "branch_activity",
            Self::Release => "releases",
            Self::Star | Self::Fork => "repo_activity",
            Self::Membership | Self::Installation => "administration",
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The repository an event refers to, as sent in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: DbId,
    pub full_name: String,
}

/// The account that triggered an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: DbId,
    pub login: String,
    /// Account type as reported by the provider: `"User"`, `"Bot"`, or
    /// `"Organization"`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Sender {
    pub fn is_bot(&self) -> bool {
        self.kind == "Bot"
    }
}

/// One inbound webhook delivery, parsed and validated at ingestion and
/// passed as a typed value through filter, decision, and render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub kind: EventKind,
    /// The payload's `action` field; empty for kinds that carry none
    /// (e.g. `push`).
    pub action: String,
    /// Provider-assigned delivery identifier (the `X-GitHub-Delivery`
    /// header), unique per delivery attempt.
    pub delivery_id: String,
    pub repository: Option<Repository>,
    pub sender: Option<Sender>,
    /// The full payload, retained for rendering and audit.
    pub payload: serde_json::Value,
}

impl WebhookEnvelope {
    /// Build an envelope from a parsed payload and its headers.
    ///
    /// Pulls `action`, `repository`, and `sender` out of the payload;
    /// absent fields stay `None`/empty rather than failing, since several
    /// supported kinds legitimately omit them.
    pub fn from_payload(
        kind: EventKind,
        delivery_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        let action = payload
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let repository = payload
            .get("repository")
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        let sender = payload
            .get("sender")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        Self {
            kind,
            action,
            delivery_id: delivery_id.into(),
            repository,
            sender,
            payload,
        }
    }

    /// Login of the account that triggered this event, if present.
    pub fn sender_login(&self) -> Option<&str> {
        self.sender.as_ref().map(|s| s.login.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
