//! Digest configuration and audit entity models.

use gitpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `digest_configs` table.
///
/// Owned by the external settings CRUD; the scheduler only reads these.
/// `weekdays` uses 0 = Sunday .. 6 = Saturday. `repo_filter` is either
/// the JSON string `"all"` or a JSON array of repository ids.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DigestConfig {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub enabled: bool,
    pub deliver_at: String,
    pub timezone: String,
    pub weekdays: Vec<i16>,
    pub scope: String,
    pub scope_value: Option<String>,
    pub repo_filter: serde_json::Value,
    pub delivery_type: String,
    pub delivery_target: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DigestConfig {
    /// Repository ids this config restricts to, or `None` for "all".
    pub fn repo_id_filter(&self) -> Option<Vec<DbId>> {
        match &self.repo_filter {
            serde_json::Value::Array(_) => {
                serde_json::from_value(self.repo_filter.clone()).ok()
            }
            _ => None,
        }
    }
}

/// A row from the append-only `user_digests` audit table.
///
/// One row per handled (config, local day), written whether or not
/// anything was sent. `message_ts` is NULL for "ran, nothing to send" and
/// for email deliveries.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserDigest {
    pub id: DbId,
    pub config_id: DbId,
    pub user_id: DbId,
    pub sent_at: Timestamp,
    pub pr_count: i32,
    pub issue_count: i32,
    pub delivery_type: String,
    pub delivery_target: Option<String>,
    pub message_ts: Option<String>,
}
