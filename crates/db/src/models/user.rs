//! User credential and tracked-repository models.

use gitpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// The credentials subset of a `users` row consumed by this core.
///
/// Account CRUD and OAuth exchange live in the excluded identity layer;
/// here the row is read for decisioning and token use, and written only
/// when a token refresh stores the replacement access token.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub slack_user_id: String,
    pub github_login: String,
    #[serde(skip_serializing)]
    pub github_access_token: Option<String>,
    #[serde(skip_serializing)]
    pub github_refresh_token: Option<String>,
    /// Preference-key → bool map consulted by the legacy notification
    /// fallback. Missing keys default to enabled.
    pub notification_prefs: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Look up a legacy notification preference flag; absent keys are on.
    pub fn preference_enabled(&self, key: &str) -> bool {
        self.notification_prefs
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }
}

/// A row from `tracked_repositories`: one repository a user's digests
/// cover.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrackedRepository {
    pub id: DbId,
    pub user_id: DbId,
    pub repository_id: DbId,
    pub full_name: String,
    pub created_at: Timestamp,
}
