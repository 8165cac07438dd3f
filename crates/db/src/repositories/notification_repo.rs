//! Repository for the `notifications` table.

use gitpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::Notification;

/// Column list for `notifications` queries.
const COLUMNS: &str =
    "id, user_id, event_id, message_type, payload, reason, context, message_ts, created_at";

/// Provides create/update operations for notification audit rows.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a notification row for a (user, event) decision, returning
    /// the generated id. `message_ts` starts NULL; it is filled in by
    /// [`record_delivery`](Self::record_delivery) after a successful send.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        event_id: DbId,
        message_type: &str,
        payload: &serde_json::Value,
        reason: &str,
        context: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications \
                (user_id, event_id, message_type, payload, reason, context) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(message_type)
        .bind(payload)
        .bind(reason)
        .bind(context)
        .fetch_one(pool)
        .await
    }

    /// Record the provider message identifier after a successful send.
    ///
    /// Written exactly once; rows are never mutated again.
    pub async fn record_delivery(
        pool: &PgPool,
        notification_id: DbId,
        message_ts: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notifications SET message_ts = $2 \
             WHERE id = $1 AND message_ts IS NULL",
        )
        .bind(notification_id)
        .bind(message_ts)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List notifications created for a given event.
    ///
    /// The decision fan-out uses this to keep webhook redelivery
    /// idempotent: users that already have a row are not re-notified.
    pub async fn list_for_event(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications WHERE event_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Count notifications recorded for an event. Used by tests and the
    /// idempotence check.
    pub async fn count_for_event(pool: &PgPool, event_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(pool)
                .await?;
        Ok(count.unwrap_or(0))
    }
}
