//! Repository for the append-only `user_digests` audit table.

use chrono::{DateTime, Utc};
use gitpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::digest::UserDigest;

/// Column list for `user_digests` queries.
const COLUMNS: &str = "id, config_id, user_id, sent_at, pr_count, issue_count, \
    delivery_type, delivery_target, message_ts";

/// Append and query digest audit rows.
pub struct UserDigestRepo;

impl UserDigestRepo {
    /// Record a handled digest attempt, returning the generated id.
    ///
    /// Written for every matched run, including "ran, nothing to send"
    /// (zero counts, no message id), so the sent-today check covers both.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        config_id: DbId,
        user_id: DbId,
        pr_count: i32,
        issue_count: i32,
        delivery_type: &str,
        delivery_target: Option<&str>,
        message_ts: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO user_digests \
                (config_id, user_id, pr_count, issue_count, \
                 delivery_type, delivery_target, message_ts) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(config_id)
        .bind(user_id)
        .bind(pr_count)
        .bind(issue_count)
        .bind(delivery_type)
        .bind(delivery_target)
        .bind(message_ts)
        .fetch_one(pool)
        .await
    }

    /// Whether any digest row exists for a config inside a UTC window.
    ///
    /// The scheduler passes the config's timezone-local day bounds, so
    /// "today" means the user's today, not the server's.
    pub async fn exists_in_window(
        pool: &PgPool,
        config_id: DbId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM user_digests \
             WHERE config_id = $1 AND sent_at >= $2 AND sent_at < $3 \
             LIMIT 1",
        )
        .bind(config_id)
        .bind(start)
        .bind(end)
        .fetch_optional(pool)
        .await?;
        Ok(found.is_some())
    }

    /// List digest rows for a config, newest first. Used by tests and the
    /// audit surface.
    pub async fn list_for_config(
        pool: &PgPool,
        config_id: DbId,
        limit: i64,
    ) -> Result<Vec<UserDigest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_digests \
             WHERE config_id = $1 ORDER BY sent_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, UserDigest>(&query)
            .bind(config_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
