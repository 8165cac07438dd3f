//! Delivery dispatcher.
//!
//! Routes a rendered message to its delivery target: a user's DM channel,
//! a named channel, or (for digests) an email address. Slack sends return
//! `Ok(Some(ts))` on success and `Ok(None)` when the API declined the
//! message; transport failures propagate as errors. There is no built-in
//! retry; callers record undelivered outcomes on their audit rows.

use std::sync::Arc;

use gitpulse_slack::{Message, SlackClient, SlackError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from message delivery.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Slack transport failure.
    #[error(transparent)]
    Slack(#[from] SlackError),

    /// SMTP transport-level failure.
    #[error("SMTP transport error: {0}")]
    EmailTransport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    EmailAddress(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    EmailBuild(String),

    /// Email delivery requested but SMTP is not configured.
    #[error("Email delivery is not configured (SMTP_HOST unset)")]
    EmailNotConfigured,
}

// ---------------------------------------------------------------------------
// Email configuration
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "digests@gitpulse.local";

/// SMTP configuration for digest email delivery.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured; `email`-type digest configs then fail
    /// with [`DispatchError::EmailNotConfigured`].
    ///
    /// | Variable        | Required | Default                  |
    /// |-----------------|----------|--------------------------|
    /// | `SMTP_HOST`     | yes      | —                        |
    /// | `SMTP_PORT`     | no       | `587`                    |
    /// | `SMTP_FROM`     | no       | `digests@gitpulse.local` |
    /// | `SMTP_USER`     | no       | —                        |
    /// | `SMTP_PASSWORD` | no       | —                        |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Sends rendered messages to their delivery targets.
pub struct Dispatcher {
    slack: Arc<SlackClient>,
    bot_token: String,
    email: Option<EmailConfig>,
}

impl Dispatcher {
    pub fn new(slack: Arc<SlackClient>, bot_token: String, email: Option<EmailConfig>) -> Self {
        Self {
            slack,
            bot_token,
            email,
        }
    }

    /// Open (or resolve) the user's DM channel and post the message.
    ///
    /// Returns the message identifier, or `None` when Slack declined
    /// either the channel open or the post.
    pub async fn send_direct(
        &self,
        slack_user_id: &str,
        message: &Message,
    ) -> Result<Option<String>, DispatchError> {
        let Some(channel) = self.slack.open_dm(&self.bot_token, slack_user_id).await? else {
            return Ok(None);
        };
        Ok(self
            .slack
            .post_message(&self.bot_token, &channel, message)
            .await?)
    }

    /// Post the message to a named channel.
    pub async fn send_to_channel(
        &self,
        channel_id: &str,
        message: &Message,
    ) -> Result<Option<String>, DispatchError> {
        Ok(self
            .slack
            .post_message(&self.bot_token, channel_id, message)
            .await?)
    }

    /// Send a plain-text digest email.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DispatchError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message as MimeMessage, Tokio1Executor,
        };

        let Some(config) = &self.email else {
            return Err(DispatchError::EmailNotConfigured);
        };

        let email = MimeMessage::builder()
            .from(config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DispatchError::EmailBuild(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(to = to_email, "Digest email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
