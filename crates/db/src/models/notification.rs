//! Notification entity model.

use gitpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table: one (user, event) decision to
/// notify, with the rendered payload snapshot and the delivery outcome.
///
/// `message_ts` stays NULL until the send succeeds; a row that keeps a
/// NULL `message_ts` is "created but undelivered" and is not retried.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub event_id: DbId,
    pub message_type: String,
    pub payload: serde_json::Value,
    pub reason: String,
    pub context: String,
    pub message_ts: Option<String>,
    pub created_at: Timestamp,
}
