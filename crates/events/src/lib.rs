//! Orchestration services for the notification and digest pipeline.
//!
//! - [`ingest`] — webhook verification, relevance filtering, event
//!   storage, and membership/installation side effects.
//! - [`decision`] — per-user notification decisioning and fan-out.
//! - [`categorize`] — API-driven pull-request bucket assembly.
//! - [`digest`] — the periodic digest scheduler.
//! - [`dispatch`] — Slack DM/channel and email delivery.
//! - [`tokens`] — the database-backed token service.
//! - [`retention`] — webhook event retention sweep.

pub mod categorize;
pub mod decision;
pub mod digest;
pub mod dispatch;
pub mod ingest;
pub mod retention;
pub mod tokens;

pub use decision::{DecisionEngine, PreferenceProfileMatcher, ProfileMatcher};
pub use digest::DigestScheduler;
pub use dispatch::Dispatcher;
pub use ingest::WebhookProcessor;
pub use tokens::StoredTokenService;
