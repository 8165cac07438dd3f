//! Pull-request categorization rules.
//!
//! The digest pipeline reduces every open pull request to one of four
//! buckets from the perspective of a single subject user (or their team).
//! The rules here are pure; the `gitpulse-events` crate assembles
//! [`PrView`] values from the GitHub API and applies them.

use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Whose pull requests a digest considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestScope {
    /// Only the subject user's own activity.
    User,
    /// All members of a team. Logins are compared case-sensitively, as
    /// returned by the provider.
    Team { members: BTreeSet<String> },
}

impl DigestScope {
    /// Whether `login` belongs to the scope's authoring set.
    fn is_author_in_scope(&self, subject: &str, login: &str) -> bool {
        match self {
            DigestScope::User => login == subject,
            DigestScope::Team { members } => members.contains(login),
        }
    }
}

/// Everything the categorizer needs to know about one open pull request.
#[derive(Debug, Clone)]
pub struct PrView {
    pub number: i64,
    pub title: String,
    pub url: String,
    pub author: String,
    pub draft: bool,
    /// `Some(false)` only when the provider explicitly reports the PR as
    /// non-mergeable; `None` means "not yet computed" and does not block
    /// the approved bucket.
    pub mergeable: Option<bool>,
    pub requested_reviewers: Vec<String>,
    pub assignees: Vec<String>,
    /// Whether at least one user other than the author approved.
    pub approved_by_other: bool,
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// The four digest buckets. Every in-scope open PR lands in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// The subject is a requested reviewer and has not reviewed yet.
    WaitingOnUser,
    /// Authored in scope, approved by someone else, not draft, not
    /// explicitly non-mergeable.
    ApprovedReadyToMerge,
    /// Authored in scope (or team fallthrough), open and not draft.
    UserOpenPrs,
    /// Authored in scope (or team fallthrough), still a draft.
    UserDraftPrs,
}

/// Outcome of classifying a single PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    In(Bucket),
    /// The PR does not involve the subject/team at all.
    OutOfScope,
    /// In scope but covered by no bucket rule (user scope, assignee-only).
    /// Callers must log these; they are never silently dropped.
    Unmatched,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Classify one open pull request from the subject's perspective.
///
/// Order matters: authorship wins over reviewer status, so a PR the
/// subject both authored and (oddly) was asked to review counts as their
/// own. Team-scope PRs that are neither authored by the team nor awaiting
/// the subject's review classify by draft flag, the deterministic
/// resolution of what used to be an unreachable branch upstream.
pub fn classify(subject: &str, scope: &DigestScope, pr: &PrView) -> Classification {
    if !is_in_scope(subject, scope, pr) {
        return Classification::OutOfScope;
    }

    if scope.is_author_in_scope(subject, &pr.author) {
        return Classification::In(own_pr_bucket(pr));
    }

    if pr.requested_reviewers.iter().any(|r| r == subject) {
        return Classification::In(Bucket::WaitingOnUser);
    }

    match scope {
        // Team scope: authored by a non-member but still in scope, or a
        // member-authored PR already handled above. Classify by draft
        // flag rather than leaving the branch unreachable.
        DigestScope::Team { .. } => Classification::In(if pr.draft {
            Bucket::UserDraftPrs
        } else {
            Bucket::UserOpenPrs
        }),
        // User scope: only an assignee-only PR reaches this point. No
        // bucket rule covers it; surface it for logging.
        DigestScope::User => Classification::Unmatched,
    }
}

/// Bucket for a PR authored inside the scope.
fn own_pr_bucket(pr: &PrView) -> Bucket {
    if pr.approved_by_other && !pr.draft && pr.mergeable != Some(false) {
        Bucket::ApprovedReadyToMerge
    } else if pr.draft {
        Bucket::UserDraftPrs
    } else {
        Bucket::UserOpenPrs
    }
}

/// Scope membership: author, requested reviewers, or assignees must touch
/// the subject (user scope) or the member set (team scope).
fn is_in_scope(subject: &str, scope: &DigestScope, pr: &PrView) -> bool {
    match scope {
        DigestScope::User => {
            pr.author == subject
                || pr.requested_reviewers.iter().any(|r| r == subject)
                || pr.assignees.iter().any(|a| a == subject)
        }
        DigestScope::Team { members } => {
            members.contains(&pr.author)
                || pr.requested_reviewers.iter().any(|r| members.contains(r))
                || pr.assignees.iter().any(|a| members.contains(a))
        }
    }
}

// ---------------------------------------------------------------------------
// Bucket collection
// ---------------------------------------------------------------------------

/// Categorized PRs for one digest run.
#[derive(Debug, Clone, Default)]
pub struct DigestBuckets {
    pub waiting_on_user: Vec<PrView>,
    pub approved_ready_to_merge: Vec<PrView>,
    pub user_open_prs: Vec<PrView>,
    pub user_draft_prs: Vec<PrView>,
}

impl DigestBuckets {
    pub fn push(&mut self, bucket: Bucket, pr: PrView) {
        match bucket {
            Bucket::WaitingOnUser => self.waiting_on_user.push(pr),
            Bucket::ApprovedReadyToMerge => self.approved_ready_to_merge.push(pr),
            Bucket::UserOpenPrs => self.user_open_prs.push(pr),
            Bucket::UserDraftPrs => self.user_draft_prs.push(pr),
        }
    }

    /// Total PRs across all buckets; a zero total suppresses delivery.
    pub fn total(&self) -> usize {
        self.waiting_on_user.len()
            + self.approved_ready_to_merge.len()
            + self.user_open_prs.len()
            + self.user_draft_prs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(author: &str) -> PrView {
        PrView {
            number: 1,
            title: "Add feature".into(),
            url: "https://example.test/pr/1".into(),
            author: author.into(),
            draft: false,
            mergeable: None,
            requested_reviewers: vec![],
            assignees: vec![],
            approved_by_other: false,
        }
    }

    fn team(members: &[&str]) -> DigestScope {
        DigestScope::Team {
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn requested_reviewer_waits_on_user() {
        let mut p = pr("alice");
        p.requested_reviewers = vec!["bob".into()];

        assert_eq!(
            classify("bob", &DigestScope::User, &p),
            Classification::In(Bucket::WaitingOnUser)
        );
        // The same PR is alice's own open PR, not something she waits on.
        assert_eq!(
            classify("alice", &DigestScope::User, &p),
            Classification::In(Bucket::UserOpenPrs)
        );
    }

    #[test]
    fn approved_non_draft_is_ready_to_merge() {
        let mut p = pr("alice");
        p.approved_by_other = true;

        assert_eq!(
            classify("alice", &DigestScope::User, &p),
            Classification::In(Bucket::ApprovedReadyToMerge)
        );
    }

    #[test]
    fn approved_draft_stays_in_draft_bucket() {
        let mut p = pr("alice");
        p.approved_by_other = true;
        p.draft = true;

        assert_eq!(
            classify("alice", &DigestScope::User, &p),
            Classification::In(Bucket::UserDraftPrs)
        );
    }

    #[test]
    fn explicitly_non_mergeable_is_not_ready() {
        let mut p = pr("alice");
        p.approved_by_other = true;
        p.mergeable = Some(false);

        assert_eq!(
            classify("alice", &DigestScope::User, &p),
            Classification::In(Bucket::UserOpenPrs)
        );
    }

    #[test]
    fn unknown_mergeability_does_not_block_ready() {
        let mut p = pr("alice");
        p.approved_by_other = true;
        p.mergeable = None;

        assert_eq!(
            classify("alice", &DigestScope::User, &p),
            Classification::In(Bucket::ApprovedReadyToMerge)
        );
    }

    #[test]
    fn unrelated_pr_is_out_of_scope() {
        let p = pr("mallory");
        assert_eq!(classify("bob", &DigestScope::User, &p), Classification::OutOfScope);
    }

    #[test]
    fn user_scope_assignee_only_pr_is_unmatched() {
        let mut p = pr("alice");
        p.assignees = vec!["bob".into()];

        // In scope for bob via assignment, but bob neither authored it
        // nor was asked to review: no bucket rule covers it.
        assert_eq!(
            classify("bob", &DigestScope::User, &p),
            Classification::Unmatched
        );
    }

    #[test]
    fn team_scope_counts_any_member_author() {
        let scope = team(&["alice", "bob"]);
        let mut p = pr("alice");
        p.approved_by_other = true;

        // bob's team digest shows alice's approved PR as ready.
        assert_eq!(
            classify("bob", &scope, &p),
            Classification::In(Bucket::ApprovedReadyToMerge)
        );
    }

    #[test]
    fn team_scope_reviewer_request_beats_fallthrough() {
        let scope = team(&["alice", "bob"]);
        let mut p = pr("carol");
        p.requested_reviewers = vec!["bob".into()];

        assert_eq!(
            classify("bob", &scope, &p),
            Classification::In(Bucket::WaitingOnUser)
        );
    }

    #[test]
    fn team_scope_fallthrough_classifies_by_draft_flag() {
        let scope = team(&["alice", "bob"]);
        // Authored outside the team but assigned to a member, so in scope;
        // bob is not the author and not a requested reviewer.
        let mut open = pr("carol");
        open.assignees = vec!["alice".into()];
        let mut draft = open.clone();
        draft.draft = true;

        assert_eq!(
            classify("bob", &scope, &open),
            Classification::In(Bucket::UserOpenPrs)
        );
        assert_eq!(
            classify("bob", &scope, &draft),
            Classification::In(Bucket::UserDraftPrs)
        );
    }

    #[test]
    fn team_scope_ignores_non_members_entirely() {
        let scope = team(&["alice", "bob"]);
        let p = pr("mallory");
        assert_eq!(classify("bob", &scope, &p), Classification::OutOfScope);
    }

    #[test]
    fn every_in_scope_pr_lands_in_exactly_one_bucket() {
        // Exhaustive-ish sweep over the flag combinations for an in-scope
        // author; classification must always produce a bucket.
        for draft in [false, true] {
            for approved in [false, true] {
                for mergeable in [None, Some(true), Some(false)] {
                    let mut p = pr("alice");
                    p.draft = draft;
                    p.approved_by_other = approved;
                    p.mergeable = mergeable;

                    match classify("alice", &DigestScope::User, &p) {
                        Classification::In(_) => {}
                        other => panic!("expected a bucket, got {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn buckets_total_counts_all_four() {
        let mut buckets = DigestBuckets::default();
        buckets.push(Bucket::WaitingOnUser, pr("a"));
        buckets.push(Bucket::ApprovedReadyToMerge, pr("b"));
        buckets.push(Bucket::UserOpenPrs, pr("c"));
        buckets.push(Bucket::UserDraftPrs, pr("d"));

        assert_eq!(buckets.total(), 4);
        assert!(!buckets.is_empty());
        assert!(DigestBuckets::default().is_empty());
    }
}
