//! Repository for the credentials subset of the `users` table, plus each
//! user's tracked repositories.

use gitpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{TrackedRepository, User};

/// Column list for `users` queries.
const USER_COLUMNS: &str = "id, slack_user_id, github_login, github_access_token, \
    github_refresh_token, notification_prefs, is_active, created_at, updated_at";

/// Column list for `tracked_repositories` queries.
const REPO_COLUMNS: &str = "id, user_id, repository_id, full_name, created_at";

/// Read access to user credentials; writes are limited to storing a
/// refreshed access token.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, user_id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by their GitHub login.
    pub async fn find_by_github_login(
        pool: &PgPool,
        login: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE github_login = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(pool)
            .await
    }

    /// List active users tracking the given repository.
    ///
    /// This is the fan-out set for per-user notification decisioning.
    pub async fn list_active_tracking_repository(
        pool: &PgPool,
        repository_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             WHERE u.is_active AND EXISTS ( \
                 SELECT 1 FROM tracked_repositories tr \
                 WHERE tr.user_id = u.id AND tr.repository_id = $1) \
             ORDER BY u.id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(repository_id)
            .fetch_all(pool)
            .await
    }

    /// Store a refreshed access token.
    pub async fn update_access_token(
        pool: &PgPool,
        user_id: DbId,
        access_token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET github_access_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(access_token)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List the repositories a user tracks.
    pub async fn list_tracked_repositories(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<TrackedRepository>, sqlx::Error> {
        let query = format!(
            "SELECT {REPO_COLUMNS} FROM tracked_repositories \
             WHERE user_id = $1 ORDER BY full_name"
        );
        sqlx::query_as::<_, TrackedRepository>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
