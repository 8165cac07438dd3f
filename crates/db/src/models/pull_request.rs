//! Mirrored pull-request projection models.

use gitpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `pull_requests` mirror table, keyed by the upstream id.
///
/// `(repository_id, number)` is unique. `mergeable` is tri-state: the
/// provider reports NULL until it has computed mergeability.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PullRequest {
    pub id: DbId,
    pub github_id: DbId,
    pub repository_id: DbId,
    pub number: DbId,
    pub title: String,
    pub url: String,
    pub author_login: String,
    pub state: String,
    pub draft: bool,
    pub mergeable: Option<bool>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A requested reviewer child row (`pr_reviewers`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrReviewer {
    pub id: DbId,
    pub pull_request_id: DbId,
    pub login: String,
}

/// An assignee child row (`pr_assignees`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrAssignee {
    pub id: DbId,
    pub pull_request_id: DbId,
    pub login: String,
}

/// A label child row (`pr_labels`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrLabel {
    pub id: DbId,
    pub pull_request_id: DbId,
    pub name: String,
}

/// A check-run child row (`pr_checks`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrCheck {
    pub id: DbId,
    pub pull_request_id: DbId,
    pub name: String,
    pub status: String,
}

/// Upsert payload for one mirrored pull request, assembled from a webhook
/// payload or a sync run.
#[derive(Debug, Clone)]
pub struct UpsertPullRequest {
    pub github_id: DbId,
    pub repository_id: DbId,
    pub number: DbId,
    pub title: String,
    pub url: String,
    pub author_login: String,
    pub state: String,
    pub draft: bool,
    pub mergeable: Option<bool>,
    pub requested_reviewers: Vec<String>,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
}
