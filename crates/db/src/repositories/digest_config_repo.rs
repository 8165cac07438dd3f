//! Repository for the `digest_configs` table.
//!
//! Config CRUD belongs to the excluded settings layer; the scheduler only
//! ever lists enabled configs.

use gitpulse_core::types::DbId;
use sqlx::PgPool;

use crate::models::digest::DigestConfig;

/// Column list for `digest_configs` queries.
const COLUMNS: &str = "id, user_id, name, enabled, deliver_at, timezone, weekdays, \
    scope, scope_value, repo_filter, delivery_type, delivery_target, created_at, updated_at";

/// Read access to digest schedules.
pub struct DigestConfigRepo;

impl DigestConfigRepo {
    /// List every enabled config, ordered by id for deterministic runs.
    pub async fn list_enabled(pool: &PgPool) -> Result<Vec<DigestConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM digest_configs WHERE enabled ORDER BY id");
        sqlx::query_as::<_, DigestConfig>(&query).fetch_all(pool).await
    }

    /// Find a config by id.
    pub async fn find_by_id(
        pool: &PgPool,
        config_id: DbId,
    ) -> Result<Option<DigestConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM digest_configs WHERE id = $1");
        sqlx::query_as::<_, DigestConfig>(&query)
            .bind(config_id)
            .fetch_optional(pool)
            .await
    }
}
