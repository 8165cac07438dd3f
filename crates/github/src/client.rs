//! Thin GitHub REST client.
//!
//! Covers the three endpoints the digest pipeline needs. Authorization
//! failures map to [`GithubError::Unauthorized`] so the token-refresh
//! wrapper can distinguish them from transient failures.

use std::time::Duration;

use reqwest::header;

use crate::types::{PullRequest, Review, TeamMember};

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Public GitHub API base; overridable for GHE installs and tests.
const DEFAULT_API_BASE: &str = "https://api.github.com";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from GitHub API calls and the token-refresh wrapper.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// The token was rejected (HTTP 401). Eligible for one refresh+retry.
    #[error("GitHub rejected the access token")]
    Unauthorized,

    /// The user must re-authorize; refresh failed or no refresh token
    /// exists. Terminal, never retried.
    #[error("GitHub authorization expired; user must reconnect their account")]
    ReauthRequired,

    /// The underlying HTTP request failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned an unexpected non-2xx status.
    #[error("GitHub returned HTTP {0}")]
    Status(u16),

    /// The identity/token collaborator failed (storage, transport).
    #[error("Token service error: {0}")]
    TokenStore(String),
}

impl GithubError {
    /// Whether this error should trigger the single token refresh.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GithubError::Unauthorized)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Reqwest-backed GitHub REST client. Tokens are passed per call because
/// every request runs under some user's credentials.
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    /// Create a client against the public GitHub API.
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Create a client against a custom API base URL.
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("gitpulse"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .expect("Failed to build reqwest HTTP client");

        Self {
            http,
            api_base: api_base.into(),
        }
    }

    /// List open pull requests for a repository (`owner/name`).
    pub async fn list_open_pull_requests(
        &self,
        token: &str,
        repo_full_name: &str,
    ) -> Result<Vec<PullRequest>, GithubError> {
        let url = format!(
            "{}/repos/{repo_full_name}/pulls?state=open&per_page=100",
            self.api_base
        );
        self.get_json(token, &url).await
    }

    /// List reviews submitted on a pull request.
    pub async fn list_reviews(
        &self,
        token: &str,
        repo_full_name: &str,
        number: i64,
    ) -> Result<Vec<Review>, GithubError> {
        let url = format!(
            "{}/repos/{repo_full_name}/pulls/{number}/reviews?per_page=100",
            self.api_base
        );
        self.get_json(token, &url).await
    }

    /// List the members of an organization team.
    pub async fn list_team_members(
        &self,
        token: &str,
        org: &str,
        team_slug: &str,
    ) -> Result<Vec<TeamMember>, GithubError> {
        let url = format!(
            "{}/orgs/{org}/teams/{team_slug}/members?per_page=100",
            self.api_base
        );
        self.get_json(token, &url).await
    }

    /// Execute an authenticated GET and decode the JSON response.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
    ) -> Result<T, GithubError> {
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GithubError::Unauthorized);
        }
        if !status.is_success() {
            return Err(GithubError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
