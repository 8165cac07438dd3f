//! Digest scheduler.
//!
//! Runs on a fixed 15-minute interval. Each tick walks every enabled
//! digest config and converts "now" into the config's timezone; when the
//! schedule matches and nothing was sent today, it categorizes the
//! user's pull requests, renders, and delivers. Every matched config gets
//! a `user_digests` audit row, including "ran, nothing to send" runs.
//!
//! A tick that fires while the previous run is still going is dropped,
//! not queued: the `AtomicBool` single-flight guard covers this process
//! only. Multi-instance deployments need exactly one scheduler.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gitpulse_core::categorize::DigestScope;
use gitpulse_core::{schedule, CoreError};
use gitpulse_db::models::digest::DigestConfig;
use gitpulse_db::models::user::User;
use gitpulse_db::repositories::{DigestConfigRepo, TeamMemberRepo, UserDigestRepo, UserRepo};
use gitpulse_db::DbPool;
use gitpulse_github::GithubError;
use gitpulse_slack::render;
use tokio_util::sync::CancellationToken;

use crate::categorize::PrCategorizer;
use crate::dispatch::{DispatchError, Dispatcher};

/// Scheduler tick cadence. Matches the quarter-hour flooring in
/// `gitpulse_core::schedule`.
const TICK_INTERVAL: Duration = Duration::from_secs(15 * 60);

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Errors raised while handling a single config.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Github(#[from] GithubError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Digest config {0} references a missing user")]
    MissingUser(i64),
}

/// What happened to one config during a tick.
#[derive(Debug, PartialEq, Eq)]
enum ConfigOutcome {
    NotDue,
    AlreadySent,
    SentEmpty,
    Sent,
}

/// Counters for one scheduler run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub matched: usize,
    pub already_sent: usize,
    pub sent: usize,
    pub empty: usize,
    pub errors: usize,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Periodic digest processor.
pub struct DigestScheduler {
    pool: DbPool,
    categorizer: Arc<PrCategorizer>,
    dispatcher: Arc<Dispatcher>,
    in_progress: AtomicBool,
}

impl DigestScheduler {
    pub fn new(pool: DbPool, categorizer: Arc<PrCategorizer>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            pool,
            categorizer,
            dispatcher,
            in_progress: AtomicBool::new(false),
        }
    }

    /// Run the scheduler loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Digest scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.tick(Utc::now()).await;
                }
            }
        }
    }

    /// One guarded tick. Drops the tick if a run is already in flight.
    pub async fn tick(&self, now: DateTime<Utc>) -> Option<RunSummary> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Digest run still in progress, dropping tick");
            return None;
        }

        let summary = self.run_once(now).await;
        self.in_progress.store(false, Ordering::SeqCst);
        Some(summary)
    }

    /// Walk every enabled config once. Per-config errors are counted and
    /// logged, never propagated; the batch always completes.
    pub async fn run_once(&self, now: DateTime<Utc>) -> RunSummary {
        let configs = match DigestConfigRepo::list_enabled(&self.pool).await {
            Ok(configs) => configs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list digest configs");
                return RunSummary {
                    errors: 1,
                    ..RunSummary::default()
                };
            }
        };

        let mut summary = RunSummary {
            total: configs.len(),
            ..RunSummary::default()
        };

        for config in &configs {
            match self.process_config(config, now).await {
                Ok(ConfigOutcome::NotDue) => {}
                Ok(ConfigOutcome::AlreadySent) => {
                    summary.matched += 1;
                    summary.already_sent += 1;
                }
                Ok(ConfigOutcome::SentEmpty) => {
                    summary.matched += 1;
                    summary.empty += 1;
                }
                Ok(ConfigOutcome::Sent) => {
                    summary.matched += 1;
                    summary.sent += 1;
                }
                Err(e) => {
                    summary.errors += 1;
                    tracing::error!(
                        config_id = config.id,
                        user_id = config.user_id,
                        error = %e,
                        "Digest config failed"
                    );
                }
            }
        }

        if summary.matched > 0 || summary.errors > 0 {
            tracing::info!(
                total = summary.total,
                matched = summary.matched,
                sent = summary.sent,
                empty = summary.empty,
                already_sent = summary.already_sent,
                errors = summary.errors,
                "Digest run complete"
            );
        }
        summary
    }

    /// Handle one config for this tick.
    async fn process_config(
        &self,
        config: &DigestConfig,
        now: DateTime<Utc>,
    ) -> Result<ConfigOutcome, DigestError> {
        let tz = schedule::parse_timezone(&config.timezone)?;
        let deliver_at = schedule::parse_delivery_time(&config.deliver_at)?;

        if !schedule::matches_schedule(now, tz, deliver_at, &config.weekdays) {
            return Ok(ConfigOutcome::NotDue);
        }

        let (day_start, day_end) = schedule::local_day_bounds(now, tz);
        if UserDigestRepo::exists_in_window(&self.pool, config.id, day_start, day_end).await? {
            tracing::debug!(config_id = config.id, "Digest already sent today");
            return Ok(ConfigOutcome::AlreadySent);
        }

        let user = UserRepo::find_by_id(&self.pool, config.user_id)
            .await?
            .ok_or(DigestError::MissingUser(config.id))?;
        let scope = self.resolve_scope(config).await?;
        let repositories = self.resolve_repositories(config).await?;

        let outcome = self
            .categorizer
            .categorize(user.id, &user.github_login, &scope, &repositories)
            .await?;

        if outcome.buckets.is_empty() {
            // Record the handled run so the day is not retried; nothing
            // was delivered.
            UserDigestRepo::create(
                &self.pool,
                config.id,
                user.id,
                0,
                0,
                &config.delivery_type,
                config.delivery_target.as_deref(),
                None,
            )
            .await?;
            tracing::info!(config_id = config.id, "Digest ran, nothing to send");
            return Ok(ConfigOutcome::SentEmpty);
        }

        let team_name = match &scope {
            DigestScope::Team { .. } => config.scope_value.as_deref(),
            DigestScope::User => None,
        };
        let message = render::render_digest(&outcome.buckets, &config.name, team_name);
        let message_ts = self.deliver(config, &user, &message).await?;

        UserDigestRepo::create(
            &self.pool,
            config.id,
            user.id,
            outcome.buckets.total() as i32,
            0,
            &config.delivery_type,
            config.delivery_target.as_deref(),
            message_ts.as_deref(),
        )
        .await?;

        tracing::info!(
            config_id = config.id,
            user_id = user.id,
            pr_count = outcome.buckets.total(),
            failed_repositories = outcome.failed_repositories,
            delivered = message_ts.is_some(),
            "Digest delivered"
        );
        Ok(ConfigOutcome::Sent)
    }

    /// Route the rendered digest to its delivery target.
    async fn deliver(
        &self,
        config: &DigestConfig,
        user: &User,
        message: &gitpulse_slack::Message,
    ) -> Result<Option<String>, DigestError> {
        match config.delivery_type.as_str() {
            "channel" => {
                let target = config
                    .delivery_target
                    .as_deref()
                    .ok_or_else(|| CoreError::Validation("channel digest without target".into()))?;
                Ok(self.dispatcher.send_to_channel(target, message).await?)
            }
            "email" => {
                let target = config
                    .delivery_target
                    .as_deref()
                    .ok_or_else(|| CoreError::Validation("email digest without target".into()))?;
                self.dispatcher
                    .send_email(target, &config.name, &message.text)
                    .await?;
                Ok(None)
            }
            // Anything else behaves as a DM, the default delivery type.
            _ => Ok(self.dispatcher.send_direct(&user.slack_user_id, message).await?),
        }
    }

    /// Resolve the config's scope, loading team members for team scope.
    async fn resolve_scope(&self, config: &DigestConfig) -> Result<DigestScope, DigestError> {
        if config.scope != "team" {
            return Ok(DigestScope::User);
        }
        let team_slug = config
            .scope_value
            .as_deref()
            .ok_or_else(|| CoreError::Validation("team digest without team slug".into()))?;
        let members: BTreeSet<String> = TeamMemberRepo::list_logins(&self.pool, team_slug)
            .await?
            .into_iter()
            .collect();
        Ok(DigestScope::Team { members })
    }

    /// The user's tracked repositories, narrowed by the config's filter.
    async fn resolve_repositories(
        &self,
        config: &DigestConfig,
    ) -> Result<Vec<gitpulse_db::models::user::TrackedRepository>, DigestError> {
        let mut repositories =
            UserRepo::list_tracked_repositories(&self.pool, config.user_id).await?;
        if let Some(filter) = config.repo_id_filter() {
            repositories.retain(|r| filter.contains(&r.repository_id));
        }
        Ok(repositories)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use gitpulse_github::GithubClient;
    use gitpulse_slack::SlackClient;
    use sqlx::postgres::PgPoolOptions;

    use crate::tokens::StoredTokenService;

    use super::*;

    /// A scheduler over a lazily-connecting pool pointed at nothing.
    /// Database calls fail fast with a connection error, which is enough
    /// to exercise the guard and error-counting paths without a server.
    fn offline_scheduler() -> DigestScheduler {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .expect("lazy pool construction cannot fail");
        let tokens = Arc::new(StoredTokenService::new(pool.clone(), None));
        let categorizer = Arc::new(PrCategorizer::new(
            Arc::new(GithubClient::with_api_base("http://127.0.0.1:1")),
            tokens,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(SlackClient::with_api_base("http://127.0.0.1:1")),
            "xoxb-test".into(),
            None,
        ));
        DigestScheduler::new(pool, categorizer, dispatcher)
    }

    #[tokio::test]
    async fn tick_while_in_progress_is_dropped() {
        let scheduler = offline_scheduler();
        scheduler.in_progress.store(true, Ordering::SeqCst);

        assert!(scheduler.tick(Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn tick_releases_the_guard_after_running() {
        let scheduler = offline_scheduler();

        let first = scheduler.tick(Utc::now()).await;
        assert!(first.is_some());
        // The guard was released; a second tick runs again.
        let second = scheduler.tick(Utc::now()).await;
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn unreachable_database_is_counted_not_thrown() {
        let scheduler = offline_scheduler();

        let summary = scheduler.run_once(Utc::now()).await;
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total, 0);
    }
}
