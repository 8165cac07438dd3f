//! Per-user notification decisioning and fan-out.
//!
//! For every stored event, [`DecisionEngine::process_event`] evaluates
//! each user tracking the event's repository, decides whether to notify,
//! and on a positive decision records a notification row, renders the
//! message, and dispatches it. One user's failure never blocks the rest;
//! the event's `processed` flag flips once the fan-out completes.

use std::sync::Arc;

use async_trait::async_trait;
use gitpulse_core::event::{EventKind, WebhookEnvelope};
use gitpulse_db::models::event::WebhookEvent;
use gitpulse_db::models::user::User;
use gitpulse_db::repositories::{EventRepo, NotificationRepo, UserRepo};
use gitpulse_db::DbPool;
use gitpulse_slack::render;

use crate::dispatch::Dispatcher;

// ---------------------------------------------------------------------------
// Profile matcher seam
// ---------------------------------------------------------------------------

/// Where a matched notification should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryProfile {
    Dm,
    Channel(String),
}

/// The matcher's verdict for one (user, event) pair.
#[derive(Debug, Clone)]
pub struct MatchDecision {
    pub should_notify: bool,
    pub matched_keywords: Vec<String>,
    pub profile: DeliveryProfile,
}

/// Seam onto the external keyword/LLM content analyzer.
///
/// Consumed as a black box: the engine trusts `should_notify` and the
/// delivery profile without re-checking the content itself.
#[async_trait]
pub trait ProfileMatcher: Send + Sync {
    async fn evaluate(
        &self,
        user: &User,
        envelope: &WebhookEnvelope,
    ) -> Result<MatchDecision, Box<dyn std::error::Error + Send + Sync>>;
}

/// In-tree stand-in for the analyzer: consults the user's preference
/// flags, suppresses self-notifications, and routes to DM. A real
/// analyzer implementation replaces this at wiring time.
pub struct PreferenceProfileMatcher;

#[async_trait]
impl ProfileMatcher for PreferenceProfileMatcher {
    async fn evaluate(
        &self,
        user: &User,
        envelope: &WebhookEnvelope,
    ) -> Result<MatchDecision, Box<dyn std::error::Error + Send + Sync>> {
        let own_action = envelope.sender_login() == Some(user.github_login.as_str());
        let enabled = user.preference_enabled(envelope.kind.preference_key());
        Ok(MatchDecision {
            should_notify: enabled && !own_action,
            matched_keywords: Vec::new(),
            profile: DeliveryProfile::Dm,
        })
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Whether the analyzer inspects this kind, or the legacy preference
/// fallback applies.
///
/// Content-bearing kinds (PRs, reviews, comments) carry an analyzer
/// category; `issues` predates the analyzer and stays on the preference
/// path.
fn analyzer_category(kind: EventKind) -> Option<&'static str> {
    match kind {
        EventKind::PullRequest => Some("pull_request"),
        EventKind::PullRequestReview => Some("review"),
        EventKind::PullRequestReviewComment | EventKind::IssueComment => Some("comment"),
        _ => None,
    }
}

/// A resolved notification decision for one user.
#[derive(Debug)]
struct Decision {
    should_notify: bool,
    reason: &'static str,
    context: String,
    profile: DeliveryProfile,
}

/// Per-event fan-out counters, reported by the caller's logs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FanoutSummary {
    pub users_evaluated: usize,
    pub notified: usize,
    pub undelivered: usize,
    pub errors: usize,
    /// True when the event had already been processed and the fan-out
    /// was skipped entirely.
    pub already_processed: bool,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Decides and delivers notifications for stored events.
pub struct DecisionEngine {
    pool: DbPool,
    dispatcher: Arc<Dispatcher>,
    matcher: Arc<dyn ProfileMatcher>,
}

impl DecisionEngine {
    pub fn new(pool: DbPool, dispatcher: Arc<Dispatcher>, matcher: Arc<dyn ProfileMatcher>) -> Self {
        Self {
            pool,
            dispatcher,
            matcher,
        }
    }

    /// Evaluate every relevant user for a stored event, then mark it
    /// processed.
    ///
    /// Idempotent under webhook redelivery: an already-processed event is
    /// skipped outright, and users that already have a notification row
    /// for this event are never re-notified.
    pub async fn process_event(&self, event: &WebhookEvent) -> Result<FanoutSummary, sqlx::Error> {
        if event.processed {
            tracing::debug!(event_id = event.id, "Event already processed, skipping");
            return Ok(FanoutSummary {
                already_processed: true,
                ..FanoutSummary::default()
            });
        }

        let mut summary = FanoutSummary::default();

        // Stored kinds were written from `as_wire`, so a parse failure
        // means a row from a newer/older deployment; drop it visibly.
        let Some(envelope) = rebuild_envelope(event) else {
            tracing::warn!(
                event_id = event.id,
                kind = %event.kind,
                "Stored event kind no longer recognized; marking processed"
            );
            EventRepo::mark_processed(&self.pool, event.id).await?;
            return Ok(summary);
        };
        let targets = match event.repository_id {
            Some(repository_id) => {
                UserRepo::list_active_tracking_repository(&self.pool, repository_id).await?
            }
            None => Vec::new(),
        };
        let already_notified: Vec<i64> = NotificationRepo::list_for_event(&self.pool, event.id)
            .await?
            .into_iter()
            .map(|n| n.user_id)
            .collect();

        for user in &targets {
            if already_notified.contains(&user.id) {
                continue;
            }
            summary.users_evaluated += 1;

            // One user's failure must not block the rest of the fan-out.
            match self.decide_and_deliver(user, event, &envelope).await {
                Ok(Delivered::Sent) => summary.notified += 1,
                Ok(Delivered::Undelivered) => {
                    summary.notified += 1;
                    summary.undelivered += 1;
                }
                Ok(Delivered::NotNotified) => {}
                Err(e) => {
                    summary.errors += 1;
                    tracing::error!(
                        event_id = event.id,
                        user_id = user.id,
                        error = %e,
                        "Notification decision failed for user"
                    );
                }
            }
        }

        EventRepo::mark_processed(&self.pool, event.id).await?;
        tracing::info!(
            event_id = event.id,
            users = summary.users_evaluated,
            notified = summary.notified,
            undelivered = summary.undelivered,
            errors = summary.errors,
            "Event fan-out complete"
        );
        Ok(summary)
    }

    /// Decide for one user and, if positive, record + render + dispatch.
    async fn decide_and_deliver(
        &self,
        user: &User,
        event: &WebhookEvent,
        envelope: &WebhookEnvelope,
    ) -> Result<Delivered, Box<dyn std::error::Error + Send + Sync>> {
        let decision = self.decide(user, envelope).await?;
        if !decision.should_notify {
            tracing::debug!(
                event_id = event.id,
                user_id = user.id,
                reason = decision.reason,
                "Not notifying"
            );
            return Ok(Delivered::NotNotified);
        }

        let message = render::render_event(envelope);
        let payload = serde_json::to_value(&message)?;
        let notification_id = NotificationRepo::create(
            &self.pool,
            user.id,
            event.id,
            envelope.kind.as_wire(),
            &payload,
            decision.reason,
            &decision.context,
        )
        .await?;

        let sent = match &decision.profile {
            DeliveryProfile::Dm => {
                self.dispatcher
                    .send_direct(&user.slack_user_id, &message)
                    .await
            }
            DeliveryProfile::Channel(channel) => {
                self.dispatcher.send_to_channel(channel, &message).await
            }
        };

        match sent {
            Ok(Some(ts)) => {
                NotificationRepo::record_delivery(&self.pool, notification_id, &ts).await?;
                Ok(Delivered::Sent)
            }
            Ok(None) => {
                tracing::warn!(
                    notification_id,
                    user_id = user.id,
                    "Message declined by Slack; notification left undelivered"
                );
                Ok(Delivered::Undelivered)
            }
            Err(e) => {
                // Dispatch failure is not an error for the fan-out: the
                // row stays as "created but undelivered".
                tracing::warn!(
                    notification_id,
                    user_id = user.id,
                    error = %e,
                    "Dispatch failed; notification left undelivered"
                );
                Ok(Delivered::Undelivered)
            }
        }
    }

    /// The decision proper: analyzer delegation for mapped kinds, legacy
    /// preference flags otherwise.
    async fn decide(
        &self,
        user: &User,
        envelope: &WebhookEnvelope,
    ) -> Result<Decision, Box<dyn std::error::Error + Send + Sync>> {
        if analyzer_category(envelope.kind).is_none() {
            return Ok(legacy_decision(user, envelope));
        }

        let verdict = self.matcher.evaluate(user, envelope).await?;
        Ok(Decision {
            should_notify: verdict.should_notify,
            reason: if verdict.should_notify {
                "profile_match"
            } else {
                "matcher_declined"
            },
            context: if verdict.matched_keywords.is_empty() {
                String::new()
            } else {
                format!("matched keywords: {}", verdict.matched_keywords.join(", "))
            },
            profile: verdict.profile,
        })
    }
}

#[derive(Debug)]
enum Delivered {
    Sent,
    Undelivered,
    NotNotified,
}

/// Legacy path for kinds without an analyzer category: preference-flag
/// lookup plus the own-action rule.
fn legacy_decision(user: &User, envelope: &WebhookEnvelope) -> Decision {
    if envelope.sender_login() == Some(user.github_login.as_str()) {
        return Decision {
            should_notify: false,
            reason: "own_action",
            context: String::new(),
            profile: DeliveryProfile::Dm,
        };
    }

    let key = envelope.kind.preference_key();
    if !user.preference_enabled(key) {
        return Decision {
            should_notify: false,
            reason: "preference_disabled",
            context: format!("preference key: {key}"),
            profile: DeliveryProfile::Dm,
        };
    }

    Decision {
        should_notify: true,
        reason: "preference_enabled",
        context: format!("preference key: {key}"),
        profile: DeliveryProfile::Dm,
    }
}

/// Rebuild the typed envelope from a stored event row.
fn rebuild_envelope(event: &WebhookEvent) -> Option<WebhookEnvelope> {
    let kind = EventKind::from_wire(&event.kind)?;
    Some(WebhookEnvelope::from_payload(
        kind,
        event.delivery_id.clone(),
        event.payload.clone(),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
