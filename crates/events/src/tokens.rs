//! Database-backed token service.
//!
//! Realizes the [`TokenService`] seam over the `users` credential
//! columns. Access tokens are read straight from storage; refresh uses
//! the provider's refresh-token grant when OAuth client credentials are
//! configured, and reports "no token" otherwise. The authorization-code
//! exchange that mints the first token pair lives in the external
//! identity layer.

use async_trait::async_trait;
use gitpulse_core::types::DbId;
use gitpulse_db::repositories::UserRepo;
use gitpulse_db::DbPool;
use gitpulse_github::{GithubError, TokenService};
use serde::Deserialize;

/// GitHub OAuth token endpoint.
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// OAuth app credentials needed for the refresh-token grant.
#[derive(Debug, Clone)]
pub struct OauthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Token endpoint; overridable for tests and GHE installs.
    pub token_url: String,
}

impl OauthConfig {
    /// Load from `GITHUB_CLIENT_ID` / `GITHUB_CLIENT_SECRET`.
    ///
    /// Returns `None` when either is unset; token refresh then always
    /// fails over to `ReauthRequired`.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            client_id: std::env::var("GITHUB_CLIENT_ID").ok()?,
            client_secret: std::env::var("GITHUB_CLIENT_SECRET").ok()?,
            token_url: TOKEN_URL.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Token service reading the `users` credential columns.
pub struct StoredTokenService {
    pool: DbPool,
    oauth: Option<OauthConfig>,
    http: reqwest::Client,
}

impl StoredTokenService {
    pub fn new(pool: DbPool, oauth: Option<OauthConfig>) -> Self {
        Self {
            pool,
            oauth,
            http: reqwest::Client::new(),
        }
    }

    async fn load_user(
        &self,
        user_id: DbId,
    ) -> Result<Option<gitpulse_db::models::user::User>, GithubError> {
        UserRepo::find_by_id(&self.pool, user_id)
            .await
            .map_err(|e| GithubError::TokenStore(e.to_string()))
    }
}

#[async_trait]
impl TokenService for StoredTokenService {
    async fn get_valid_token(&self, user_id: DbId) -> Result<Option<String>, GithubError> {
        Ok(self
            .load_user(user_id)
            .await?
            .and_then(|u| u.github_access_token))
    }

    async fn refresh_token(&self, user_id: DbId) -> Result<Option<String>, GithubError> {
        let Some(oauth) = &self.oauth else {
            tracing::debug!(user_id, "No OAuth credentials configured, cannot refresh");
            return Ok(None);
        };
        let Some(refresh_token) = self
            .load_user(user_id)
            .await?
            .and_then(|u| u.github_refresh_token)
        else {
            return Ok(None);
        };

        let response = self
            .http
            .post(&oauth.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", oauth.client_id.as_str()),
                ("client_secret", oauth.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| GithubError::TokenStore(e.to_string()))?;

        let parsed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| GithubError::TokenStore(e.to_string()))?;

        let Some(access_token) = parsed.access_token else {
            tracing::warn!(
                user_id,
                error = parsed.error.as_deref().unwrap_or("unknown"),
                "Token refresh declined by provider"
            );
            return Ok(None);
        };

        UserRepo::update_access_token(&self.pool, user_id, &access_token)
            .await
            .map_err(|e| GithubError::TokenStore(e.to_string()))?;

        tracing::info!(user_id, "Access token refreshed");
        Ok(Some(access_token))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
