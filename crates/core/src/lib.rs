//! Pure domain logic for the GitPulse notification pipeline.
//!
//! Everything in this crate is side-effect free: no database access, no
//! HTTP, no clocks other than values passed in by the caller. The
//! orchestration crates (`gitpulse-events`, `gitpulse-api`) wire these
//! rules to the outside world.

pub mod categorize;
pub mod error;
pub mod event;
pub mod markdown;
pub mod relevance;
pub mod schedule;
pub mod signature;
pub mod types;

pub use error::CoreError;
pub use event::{EventKind, Repository, Sender, WebhookEnvelope};
pub use relevance::{Relevance, SideEffectKind};
