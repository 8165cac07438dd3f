//! Webhook event entity model.

use gitpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `webhook_events` table.
///
/// Immutable after insert except for the `processed` flag, which flips to
/// true exactly once when the per-user fan-out for the event completes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookEvent {
    pub id: DbId,
    pub kind: String,
    pub action: String,
    pub delivery_id: String,
    pub repository_id: Option<DbId>,
    pub repository_name: Option<String>,
    pub sender_id: Option<DbId>,
    pub sender_login: Option<String>,
    pub payload: serde_json::Value,
    pub processed: bool,
    pub created_at: Timestamp,
}
