//! Repository for the `webhook_events` table.

use chrono::{DateTime, Utc};
use gitpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::WebhookEvent;

/// Column list for `webhook_events` queries.
const COLUMNS: &str = "id, kind, action, delivery_id, repository_id, repository_name, \
    sender_id, sender_login, payload, processed, created_at";

/// Provides read/write operations for inbound webhook events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning it.
    ///
    /// The provider may redeliver the same `delivery_id`; the unique index
    /// turns that into a fetch of the existing row so redelivery never
    /// duplicates events.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        pool: &PgPool,
        kind: &str,
        action: &str,
        delivery_id: &str,
        repository_id: Option<DbId>,
        repository_name: Option<&str>,
        sender_id: Option<DbId>,
        sender_login: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<WebhookEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO webhook_events \
                (kind, action, delivery_id, repository_id, repository_name, \
                 sender_id, sender_login, payload) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (delivery_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, WebhookEvent>(&query)
            .bind(kind)
            .bind(action)
            .bind(delivery_id)
            .bind(repository_id)
            .bind(repository_name)
            .bind(sender_id)
            .bind(sender_login)
            .bind(payload)
            .fetch_optional(pool)
            .await?;

        match inserted {
            Some(event) => Ok(event),
            // Redelivery: the row already exists.
            None => Self::get_by_delivery_id(pool, delivery_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Find an event by its provider delivery identifier.
    pub async fn get_by_delivery_id(
        pool: &PgPool,
        delivery_id: &str,
    ) -> Result<Option<WebhookEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM webhook_events WHERE delivery_id = $1");
        sqlx::query_as::<_, WebhookEvent>(&query)
            .bind(delivery_id)
            .fetch_optional(pool)
            .await
    }

    /// Find an event by id.
    pub async fn find_by_id(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Option<WebhookEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM webhook_events WHERE id = $1");
        sqlx::query_as::<_, WebhookEvent>(&query)
            .bind(event_id)
            .fetch_optional(pool)
            .await
    }

    /// Flip the `processed` flag.
    ///
    /// Returns `true` if the row was still unprocessed and this call
    /// flipped it; at-most-once semantics rely on the `NOT processed`
    /// predicate.
    pub async fn mark_processed(pool: &PgPool, event_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE webhook_events SET processed = TRUE WHERE id = $1 AND NOT processed",
        )
        .bind(event_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete events older than the cutoff. Used by the retention sweep.
    ///
    /// Returns the number of rows removed.
    pub async fn delete_older_than(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
