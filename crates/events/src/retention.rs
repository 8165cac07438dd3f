//! Periodic retention sweep for stored webhook events.
//!
//! Webhook events are the only unbounded table this core writes; rows
//! older than the configured retention age out on an hourly cycle.
//! Notifications and digest audit rows are kept.

use std::time::Duration;

use chrono::Utc;
use gitpulse_db::repositories::EventRepo;
use gitpulse_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Default retention period: 90 days.
const DEFAULT_RETENTION_DAYS: i64 = 90;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the event retention loop until `cancel` fires.
///
/// The retention period comes from `EVENT_RETENTION_DAYS` (days, default
/// 90).
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    let retention_days: i64 = std::env::var("EVENT_RETENTION_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETENTION_DAYS);

    tracing::info!(
        retention_days,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Event retention sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Event retention sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::days(retention_days);
                match EventRepo::delete_older_than(&pool, cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Event retention: purged old rows");
                        } else {
                            tracing::debug!("Event retention: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Event retention: sweep failed");
                    }
                }
            }
        }
    }
}
