//! Webhook ingest pipeline.
//!
//! One inbound delivery flows: signature verification → envelope parse →
//! relevance filter → side effect or persistence. Nothing is written
//! before the signature checks out, and skipped deliveries leave no
//! trace beyond a log line.

use gitpulse_core::event::{EventKind, WebhookEnvelope};
use gitpulse_core::relevance::{self, Relevance, SideEffectKind};
use gitpulse_core::signature;
use gitpulse_db::models::event::WebhookEvent;
use gitpulse_db::models::pull_request::UpsertPullRequest;
use gitpulse_db::repositories::{EventRepo, PullRequestRepo, TeamMemberRepo};
use gitpulse_db::DbPool;

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Errors that reject a delivery at ingress.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Signature mismatch, malformed signature header, or no configured
    /// secret. The delivery must be rejected without storing anything.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// The payload body is not valid JSON.
    #[error("Webhook payload is not valid JSON")]
    InvalidPayload,

    /// Storage failure while persisting the event or a side effect.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What happened to a verified delivery.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The event was persisted and should be queued for decisioning.
    Stored(WebhookEvent),
    /// A membership/installation side effect ran; no event row exists.
    Handled(&'static str),
    /// The delivery was irrelevant; nothing was persisted.
    Skipped(&'static str),
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Verifies, filters, and stores inbound webhook deliveries.
pub struct WebhookProcessor {
    pool: DbPool,
    secret: Option<String>,
}

impl WebhookProcessor {
    /// `secret` is the shared webhook secret; `None` (unset in the
    /// environment) rejects every delivery, matching the rule that a
    /// missing secret behaves like a bad signature.
    pub fn new(pool: DbPool, secret: Option<String>) -> Self {
        Self { pool, secret }
    }

    /// Process one delivery end to end.
    pub async fn process(
        &self,
        event_name: &str,
        delivery_id: &str,
        signature_header: &str,
        body: &[u8],
    ) -> Result<IngestOutcome, IngestError> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::error!("Webhook secret is not configured; rejecting delivery");
            return Err(IngestError::InvalidSignature);
        };
        if !signature::verify_signature(body, signature_header, secret.as_bytes()) {
            tracing::warn!(delivery_id, "Rejected webhook delivery: invalid signature");
            return Err(IngestError::InvalidSignature);
        }

        let payload: serde_json::Value =
            serde_json::from_slice(body).map_err(|_| IngestError::InvalidPayload)?;

        let Some(kind) = EventKind::from_wire(event_name) else {
            tracing::debug!(event_name, delivery_id, "Skipping unsupported event type");
            return Ok(IngestOutcome::Skipped("unsupported event type"));
        };
        let envelope = WebhookEnvelope::from_payload(kind, delivery_id, payload);

        match relevance::decide(&envelope) {
            Relevance::Skip(reason) => {
                tracing::debug!(
                    kind = kind.as_wire(),
                    action = %envelope.action,
                    delivery_id,
                    reason,
                    "Skipping irrelevant event"
                );
                Ok(IngestOutcome::Skipped(reason))
            }
            Relevance::SideEffect(SideEffectKind::Membership) => {
                self.handle_membership(&envelope).await?;
                Ok(IngestOutcome::Handled("membership updated"))
            }
            Relevance::SideEffect(SideEffectKind::Installation) => {
                self.handle_installation(&envelope);
                Ok(IngestOutcome::Handled("installation sync triggered"))
            }
            Relevance::Store => {
                // Keep the PR mirror warm before storing, so decisioning
                // and dashboards observe the event and the projection
                // together.
                if kind == EventKind::PullRequest {
                    self.upsert_pull_request_mirror(&envelope).await;
                }
                let event = self.store(&envelope).await?;
                Ok(IngestOutcome::Stored(event))
            }
        }
    }

    /// Persist the envelope as a `webhook_events` row.
    async fn store(&self, envelope: &WebhookEnvelope) -> Result<WebhookEvent, sqlx::Error> {
        let event = EventRepo::insert(
            &self.pool,
            envelope.kind.as_wire(),
            &envelope.action,
            &envelope.delivery_id,
            envelope.repository.as_ref().map(|r| r.id),
            envelope.repository.as_ref().map(|r| r.full_name.as_str()),
            envelope.sender.as_ref().map(|s| s.id),
            envelope.sender_login(),
            &envelope.payload,
        )
        .await?;

        tracing::info!(
            event_id = event.id,
            kind = %event.kind,
            action = %event.action,
            delivery_id = %event.delivery_id,
            "Webhook event stored"
        );
        Ok(event)
    }

    /// Apply a `membership` event to the team mirror.
    async fn handle_membership(&self, envelope: &WebhookEnvelope) -> Result<(), sqlx::Error> {
        let team_slug = envelope
            .payload
            .get("team")
            .and_then(|t| t.get("slug"))
            .and_then(|s| s.as_str());
        let member_login = envelope
            .payload
            .get("member")
            .and_then(|m| m.get("login"))
            .and_then(|l| l.as_str());

        let (Some(team_slug), Some(member_login)) = (team_slug, member_login) else {
            tracing::warn!(
                delivery_id = %envelope.delivery_id,
                "Membership event missing team or member, ignoring"
            );
            return Ok(());
        };

        match envelope.action.as_str() {
            "added" => {
                TeamMemberRepo::add(&self.pool, team_slug, member_login).await?;
                tracing::info!(team_slug, member_login, "Team member added");
            }
            "removed" => {
                TeamMemberRepo::remove(&self.pool, team_slug, member_login).await?;
                tracing::info!(team_slug, member_login, "Team member removed");
            }
            other => {
                tracing::debug!(action = other, "Ignoring membership action");
            }
        }
        Ok(())
    }

    /// Installation changes hand off to the external repository-sync
    /// collaborator; here the trigger is recorded for its poll cycle.
    fn handle_installation(&self, envelope: &WebhookEnvelope) {
        tracing::info!(
            action = %envelope.action,
            delivery_id = %envelope.delivery_id,
            "Installation changed, repository sync requested"
        );
    }

    /// Opportunistic mirror refresh from a `pull_request` payload.
    ///
    /// Mirror failures are logged, never fatal: the event itself must
    /// still be stored and processed.
    async fn upsert_pull_request_mirror(&self, envelope: &WebhookEnvelope) {
        let Some(upsert) = pull_request_upsert(envelope) else {
            return;
        };
        if let Err(e) = PullRequestRepo::upsert(&self.pool, &upsert).await {
            tracing::warn!(
                error = %e,
                delivery_id = %envelope.delivery_id,
                "Failed to refresh pull request mirror"
            );
        }
    }
}

/// Map a `pull_request` payload onto a mirror upsert.
fn pull_request_upsert(envelope: &WebhookEnvelope) -> Option<UpsertPullRequest> {
    let pr = envelope.payload.get("pull_request")?;
    let repository_id = envelope.repository.as_ref()?.id;

    let logins = |key: &str| -> Vec<String> {
        pr.get(key)
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.get("login").and_then(|l| l.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    };
    let labels = pr
        .get("labels")
        .and_then(|v| v.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.get("name").and_then(|n| n.as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(UpsertPullRequest {
        github_id: pr.get("id")?.as_i64()?,
        repository_id,
        number: pr.get("number")?.as_i64()?,
        title: pr.get("title")?.as_str()?.to_string(),
        url: pr.get("html_url")?.as_str()?.to_string(),
        author_login: pr.get("user")?.get("login")?.as_str()?.to_string(),
        state: pr.get("state")?.as_str()?.to_string(),
        draft: pr.get("draft").and_then(|d| d.as_bool()).unwrap_or(false),
        mergeable: pr.get("mergeable").and_then(|m| m.as_bool()),
        requested_reviewers: logins("requested_reviewers"),
        assignees: logins("assignees"),
        labels,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
