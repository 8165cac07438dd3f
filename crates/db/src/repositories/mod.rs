//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument and return
//! `Result<_, sqlx::Error>`.

pub mod digest_config_repo;
pub mod event_repo;
pub mod notification_repo;
pub mod pull_request_repo;
pub mod team_member_repo;
pub mod user_digest_repo;
pub mod user_repo;

pub use digest_config_repo::DigestConfigRepo;
pub use event_repo::EventRepo;
pub use notification_repo::NotificationRepo;
pub use pull_request_repo::PullRequestRepo;
pub use team_member_repo::TeamMemberRepo;
pub use user_digest_repo::UserDigestRepo;
pub use user_repo::UserRepo;
