//! Slack Web API client.
//!
//! Two operations: resolving a user's DM channel (`conversations.open`)
//! and posting a message (`chat.postMessage`). The Slack API reports
//! application-level failure as `ok: false` in a 200 response; those
//! surface as `Ok(None)` so callers can record "undelivered" without
//! conflating it with transport errors, which propagate as `Err`.

use std::time::Duration;

use serde::Deserialize;

use crate::blocks::Message;

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Public Slack API base; overridable for tests.
const DEFAULT_API_BASE: &str = "https://slack.com/api";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Transport-level errors from Slack API calls.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    /// The underlying HTTP request failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status.
    #[error("Slack returned HTTP {0}")]
    Status(u16),
}

// ---------------------------------------------------------------------------
// Wire responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OpenConversationResponse {
    ok: bool,
    #[serde(default)]
    channel: Option<ChannelRef>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Reqwest-backed Slack Web API client. The bot token is passed per call
/// so one client serves every workspace operation.
pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
}

impl SlackClient {
    /// Create a client against the public Slack API.
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Create a client against a custom API base URL.
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    /// Open (or resolve) the direct-message channel for a user.
    ///
    /// Returns the channel id, or `None` if Slack declined the request.
    pub async fn open_dm(
        &self,
        token: &str,
        slack_user_id: &str,
    ) -> Result<Option<String>, SlackError> {
        let url = format!("{}/conversations.open", self.api_base);
        let body = serde_json::json!({ "users": slack_user_id });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status(status.as_u16()));
        }

        let parsed: OpenConversationResponse = response.json().await?;
        if !parsed.ok {
            tracing::warn!(
                slack_user_id,
                error = parsed.error.as_deref().unwrap_or("unknown"),
                "conversations.open declined"
            );
            return Ok(None);
        }
        Ok(parsed.channel.map(|c| c.id))
    }

    /// Post a message to a channel (DM channels included).
    ///
    /// Returns the message `ts` identifier, or `None` if Slack declined.
    pub async fn post_message(
        &self,
        token: &str,
        channel: &str,
        message: &Message,
    ) -> Result<Option<String>, SlackError> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let body = serde_json::json!({
            "channel": channel,
            "text": message.text,
            "blocks": message.blocks,
            "attachments": message.attachments,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status(status.as_u16()));
        }

        let parsed: PostMessageResponse = response.json().await?;
        if !parsed.ok {
            tracing::warn!(
                channel,
                error = parsed.error.as_deref().unwrap_or("unknown"),
                "chat.postMessage declined"
            );
            return Ok(None);
        }
        Ok(parsed.ts)
    }
}

impl Default for SlackClient {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
