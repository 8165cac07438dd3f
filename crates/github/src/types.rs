//! Wire DTOs for the GitHub REST endpoints this client consumes.
//!
//! Fields default where the API legitimately omits them so a partial
//! payload deserializes instead of failing the whole repository.

use gitpulse_core::types::DbId;
use serde::Deserialize;

/// A GitHub account as embedded in PR and review payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: DbId,
    pub login: String,
}

/// One pull request from `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub id: DbId,
    pub number: DbId,
    pub title: String,
    pub html_url: String,
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    /// Tri-state: the API reports `null` until mergeability is computed.
    #[serde(default)]
    pub mergeable: Option<bool>,
    pub user: Account,
    #[serde(default)]
    pub requested_reviewers: Vec<Account>,
    #[serde(default)]
    pub assignees: Vec<Account>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// A label embedded in a pull request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

/// One review from `GET /repos/{owner}/{repo}/pulls/{number}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub user: Account,
    pub state: String,
}

impl Review {
    pub fn is_approval(&self) -> bool {
        self.state == "APPROVED"
    }
}

/// One member from `GET /orgs/{org}/teams/{team_slug}/members`.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamMember {
    pub id: DbId,
    pub login: String,
}
