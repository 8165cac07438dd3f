//! Repository for the mirrored `pull_requests` projection and its child
//! tables.
//!
//! The external sync collaborator owns the refresh cycle; this core
//! upserts opportunistically from `pull_request` webhook payloads so the
//! mirror stays warm between syncs. Child rows (reviewers, assignees,
//! labels) are deleted and recreated on each upsert.

use gitpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::pull_request::{PullRequest, UpsertPullRequest};

/// Column list for `pull_requests` queries.
const COLUMNS: &str = "id, github_id, repository_id, number, title, url, author_login, \
    state, draft, mergeable, created_at, updated_at";

/// Read/write operations for the pull-request mirror.
pub struct PullRequestRepo;

impl PullRequestRepo {
    /// Insert or update one mirrored PR and replace its child rows.
    ///
    /// Runs in a transaction so a partially rewritten child set is never
    /// observable.
    pub async fn upsert(pool: &PgPool, pr: &UpsertPullRequest) -> Result<DbId, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let pr_id: DbId = sqlx::query_scalar(
            "INSERT INTO pull_requests \
                (github_id, repository_id, number, title, url, author_login, \
                 state, draft, mergeable) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (github_id) DO UPDATE SET \
                title = EXCLUDED.title, \
                url = EXCLUDED.url, \
                state = EXCLUDED.state, \
                draft = EXCLUDED.draft, \
                mergeable = EXCLUDED.mergeable, \
                updated_at = NOW() \
             RETURNING id",
        )
        .bind(pr.github_id)
        .bind(pr.repository_id)
        .bind(pr.number)
        .bind(&pr.title)
        .bind(&pr.url)
        .bind(&pr.author_login)
        .bind(&pr.state)
        .bind(pr.draft)
        .bind(pr.mergeable)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM pr_reviewers WHERE pull_request_id = $1")
            .bind(pr_id)
            .execute(&mut *tx)
            .await?;
        for login in &pr.requested_reviewers {
            sqlx::query("INSERT INTO pr_reviewers (pull_request_id, login) VALUES ($1, $2)")
                .bind(pr_id)
                .bind(login)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM pr_assignees WHERE pull_request_id = $1")
            .bind(pr_id)
            .execute(&mut *tx)
            .await?;
        for login in &pr.assignees {
            sqlx::query("INSERT INTO pr_assignees (pull_request_id, login) VALUES ($1, $2)")
                .bind(pr_id)
                .bind(login)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM pr_labels WHERE pull_request_id = $1")
            .bind(pr_id)
            .execute(&mut *tx)
            .await?;
        for name in &pr.labels {
            sqlx::query("INSERT INTO pr_labels (pull_request_id, name) VALUES ($1, $2)")
                .bind(pr_id)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(pr_id)
    }

    /// Find a mirrored PR by `(repository_id, number)`.
    pub async fn find_by_repo_and_number(
        pool: &PgPool,
        repository_id: DbId,
        number: DbId,
    ) -> Result<Option<PullRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pull_requests \
             WHERE repository_id = $1 AND number = $2"
        );
        sqlx::query_as::<_, PullRequest>(&query)
            .bind(repository_id)
            .bind(number)
            .fetch_optional(pool)
            .await
    }

    /// List open mirrored PRs for a repository.
    pub async fn list_open_for_repository(
        pool: &PgPool,
        repository_id: DbId,
    ) -> Result<Vec<PullRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pull_requests \
             WHERE repository_id = $1 AND state = 'open' \
             ORDER BY number"
        );
        sqlx::query_as::<_, PullRequest>(&query)
            .bind(repository_id)
            .fetch_all(pool)
            .await
    }
}
