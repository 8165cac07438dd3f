//! Team membership mirror model.

use gitpulse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `team_members` mirror, maintained by the membership
/// side-effect handler as `membership` webhook events arrive.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeamMember {
    pub id: DbId,
    pub team_slug: String,
    pub user_login: String,
    pub created_at: Timestamp,
}
