//! Repository for the `team_members` membership mirror.

use sqlx::PgPool;

/// Maintains the membership mirror written by the side-effect handler
/// for `membership` webhook events.
pub struct TeamMemberRepo;

impl TeamMemberRepo {
    /// Record a member added to a team. Idempotent.
    pub async fn add(pool: &PgPool, team_slug: &str, user_login: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO team_members (team_slug, user_login) \
             VALUES ($1, $2) \
             ON CONFLICT (team_slug, user_login) DO NOTHING",
        )
        .bind(team_slug)
        .bind(user_login)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Remove a member from a team.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn remove(
        pool: &PgPool,
        team_slug: &str,
        user_login: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM team_members WHERE team_slug = $1 AND user_login = $2")
                .bind(team_slug)
                .bind(user_login)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Logins of all members of a team, ordered for determinism.
    pub async fn list_logins(pool: &PgPool, team_slug: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_login FROM team_members WHERE team_slug = $1 ORDER BY user_login",
        )
        .bind(team_slug)
        .fetch_all(pool)
        .await
    }
}
