//! Token loading and the single-retry refresh wrapper.
//!
//! Every GitHub call runs under a user's OAuth token. Tokens expire, so
//! the wrapper catches exactly one authorization failure per call,
//! requests a fresh token from the identity collaborator, and retries
//! once. A second failure (or a failed refresh) surfaces as
//! [`GithubError::ReauthRequired`] and is never retried again.

use std::future::Future;

use async_trait::async_trait;
use gitpulse_core::types::DbId;

use crate::client::GithubError;

// ---------------------------------------------------------------------------
// TokenService
// ---------------------------------------------------------------------------

/// Seam onto the external identity/token layer.
///
/// Both methods return `Ok(None)` when the user has no usable credential,
/// which the wrapper turns into [`GithubError::ReauthRequired`].
#[async_trait]
pub trait TokenService: Send + Sync {
    /// The user's current access token, if any.
    async fn get_valid_token(&self, user_id: DbId) -> Result<Option<String>, GithubError>;

    /// Exchange the refresh token for a new access token, persisting it.
    async fn refresh_token(&self, user_id: DbId) -> Result<Option<String>, GithubError>;
}

// ---------------------------------------------------------------------------
// Wrapper
// ---------------------------------------------------------------------------

/// Run `api_call` with the user's token, refreshing and retrying at most
/// once on an authorization failure.
///
/// Guarantees:
/// - `api_call` is invoked at most twice.
/// - `refresh_token` is invoked at most once.
/// - Non-authorization errors propagate unchanged, before and after the
///   refresh.
pub async fn with_token_refresh<T, F, Fut>(
    user_id: DbId,
    tokens: &dyn TokenService,
    api_call: F,
) -> Result<T, GithubError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, GithubError>>,
{
    let token = tokens
        .get_valid_token(user_id)
        .await?
        .ok_or(GithubError::ReauthRequired)?;

    match api_call(token).await {
        Err(GithubError::Unauthorized) => {
            tracing::info!(user_id, "Access token rejected, attempting refresh");
        }
        other => return other,
    }

    let refreshed = tokens.refresh_token(user_id).await?;
    let Some(new_token) = refreshed else {
        tracing::warn!(user_id, "Token refresh failed, reauthorization required");
        return Err(GithubError::ReauthRequired);
    };

    // Exactly one retry. A second 401 means the refreshed token is no
    // better; report it as a reauth condition rather than looping.
    match api_call(new_token).await {
        Err(GithubError::Unauthorized) => Err(GithubError::ReauthRequired),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
