//! GitHub REST API client and token-refresh machinery.
//!
//! - [`GithubClient`] — thin reqwest wrapper over the endpoints the
//!   categorizer needs (open PRs, reviews, team members).
//! - [`TokenService`] — seam onto the external identity/token layer.
//! - [`with_token_refresh`] — runs an API call with at most one
//!   refresh-and-retry on authorization failure.

pub mod client;
pub mod token;
pub mod types;

pub use client::{GithubClient, GithubError};
pub use token::{with_token_refresh, TokenService};
