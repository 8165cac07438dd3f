/// Database primary keys are PostgreSQL BIGSERIAL. GitHub's own numeric
/// ids (repositories, users, pull requests) are stored in the same width.
pub type DbId = i64;

/// All timestamps are stored in UTC; timezone math happens at the edges.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
