//! Relevance filter for inbound webhook events.
//!
//! Pure decision over `(kind, action, sender)` that gates everything
//! downstream: only events worth persisting reach the notification
//! pipeline, and membership/installation events route to side-effect
//! handlers instead of the generic event store.

use crate::event::{EventKind, WebhookEnvelope};

// ---------------------------------------------------------------------------
// Decision type
// ---------------------------------------------------------------------------

/// Side effects that bypass the generic event store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffectKind {
    /// Team membership changed; the membership mirror must be updated.
    Membership,
    /// App installation changed; a repository sync should be triggered.
    Installation,
}

/// Outcome of the relevance check for one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relevance {
    /// Persist the event and queue it for per-user decisioning.
    Store,
    /// Run a dedicated handler; do not store a generic event row.
    SideEffect(SideEffectKind),
    /// Drop the event. The reason is recorded in the handler response and
    /// logs, never persisted.
    Skip(&'static str),
}

// ---------------------------------------------------------------------------
// Action allow-lists
// ---------------------------------------------------------------------------

const PULL_REQUEST_ACTIONS: &[&str] = &[
    "opened",
    "closed",
    "reopened",
    "ready_for_review",
    "review_requested",
    "assigned",
    "unassigned",
];

const ISSUE_ACTIONS: &[&str] = &["opened", "closed", "reopened", "assigned", "unassigned"];

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Decide whether an envelope is worth persisting or acting on.
///
/// Bot senders are rejected across the board, except for membership and
/// installation events where the acting account is routinely a service
/// account.
pub fn decide(envelope: &WebhookEnvelope) -> Relevance {
    // Membership/installation side effects are evaluated before the bot
    // check on purpose.
    match envelope.kind {
        EventKind::Membership => return Relevance::SideEffect(SideEffectKind::Membership),
        EventKind::Installation => return Relevance::SideEffect(SideEffectKind::Installation),
        _ => {}
    }

    if envelope.sender.as_ref().is_some_and(|s| s.is_bot()) {
        return Relevance::Skip("bot sender");
    }

    let action = envelope.action.as_str();
    match envelope.kind {
        EventKind::PullRequest => {
            if PULL_REQUEST_ACTIONS.contains(&action) {
                Relevance::Store
            } else {
                Relevance::Skip("unsupported pull_request action")
            }
        }
        EventKind::Issues => {
            if ISSUE_ACTIONS.contains(&action) {
                Relevance::Store
            } else {
                Relevance::Skip("unsupported issues action")
            }
        }
        EventKind::PullRequestReview => {
            if action == "submitted" {
                Relevance::Store
            } else {
                Relevance::Skip("only submitted reviews are stored")
            }
        }
        EventKind::PullRequestReviewComment | EventKind::IssueComment => {
            if action == "created" {
                Relevance::Store
            } else {
                Relevance::Skip("comment edits are dropped")
            }
        }
        // Recognized for the audit trail but carrying no notification
        // path: nothing downstream consumes them, so nothing is persisted.
        EventKind::Push
        | EventKind::Create
        | EventKind::Delete
        | EventKind::Release
        | EventKind::Star
        | EventKind::Fork => Relevance::Skip("audit-only event"),
        // Handled above; unreachable but kept for exhaustiveness.
        EventKind::Membership => Relevance::SideEffect(SideEffectKind::Membership),
        EventKind::Installation => Relevance::SideEffect(SideEffectKind::Installation),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::WebhookEnvelope;

    fn envelope(kind: EventKind, action: &str, sender_type: &str) -> WebhookEnvelope {
        WebhookEnvelope::from_payload(
            kind,
            "test-delivery",
            serde_json::json!({
                "action": action,
                "sender": { "id": 1, "login": "someone", "type": sender_type },
            }),
        )
    }

    #[test]
    fn pull_request_opened_from_user_is_stored() {
        let e = envelope(EventKind::PullRequest, "opened", "User");
        assert_eq!(decide(&e), Relevance::Store);
    }

    #[test]
    fn pull_request_edited_is_always_skipped() {
        let e = envelope(EventKind::PullRequest, "edited", "User");
        assert!(matches!(decide(&e), Relevance::Skip(_)));
    }

    #[test]
    fn bot_sender_is_skipped_for_ordinary_events() {
        for kind in [
            EventKind::PullRequest,
            EventKind::PullRequestReview,
            EventKind::Issues,
            EventKind::IssueComment,
            EventKind::Push,
            EventKind::Release,
        ] {
            let e = envelope(kind, "opened", "Bot");
            assert!(
                matches!(decide(&e), Relevance::Skip("bot sender")),
                "kind {kind:?} should skip bot senders"
            );
        }
    }

    #[test]
    fn membership_from_bot_is_still_a_side_effect() {
        let e = envelope(EventKind::Membership, "added", "Bot");
        assert_eq!(decide(&e), Relevance::SideEffect(SideEffectKind::Membership));
    }

    #[test]
    fn installation_from_bot_is_still_a_side_effect() {
        let e = envelope(EventKind::Installation, "created", "Bot");
        assert_eq!(
            decide(&e),
            Relevance::SideEffect(SideEffectKind::Installation)
        );
    }

    #[test]
    fn review_submitted_stored_dismissed_skipped() {
        assert_eq!(
            decide(&envelope(EventKind::PullRequestReview, "submitted", "User")),
            Relevance::Store
        );
        assert!(matches!(
            decide(&envelope(EventKind::PullRequestReview, "dismissed", "User")),
            Relevance::Skip(_)
        ));
    }

    #[test]
    fn comment_created_stored_edited_skipped() {
        assert_eq!(
            decide(&envelope(EventKind::IssueComment, "created", "User")),
            Relevance::Store
        );
        assert!(matches!(
            decide(&envelope(EventKind::IssueComment, "edited", "User")),
            Relevance::Skip(_)
        ));
        assert!(matches!(
            decide(&envelope(
                EventKind::PullRequestReviewComment,
                "deleted",
                "User"
            )),
            Relevance::Skip(_)
        ));
    }

    #[test]
    fn issue_actions_follow_allow_list() {
        for action in ["opened", "closed", "reopened", "assigned", "unassigned"] {
            assert_eq!(
                decide(&envelope(EventKind::Issues, action, "User")),
                Relevance::Store,
                "issues/{action} should be stored"
            );
        }
        assert!(matches!(
            decide(&envelope(EventKind::Issues, "labeled", "User")),
            Relevance::Skip(_)
        ));
    }

    #[test]
    fn audit_only_kinds_are_recognized_but_skipped() {
        for kind in [
            EventKind::Push,
            EventKind::Create,
            EventKind::Delete,
            EventKind::Release,
            EventKind::Star,
            EventKind::Fork,
        ] {
            let e = WebhookEnvelope::from_payload(
                kind,
                "test-delivery",
                serde_json::json!({
                    "sender": { "id": 1, "login": "someone", "type": "User" },
                }),
            );
            assert_eq!(decide(&e), Relevance::Skip("audit-only event"));
        }
    }

    #[test]
    fn missing_sender_is_not_treated_as_bot() {
        let e = WebhookEnvelope::from_payload(
            EventKind::PullRequest,
            "test-delivery",
            serde_json::json!({ "action": "opened" }),
        );
        assert_eq!(decide(&e), Relevance::Store);
    }
}
