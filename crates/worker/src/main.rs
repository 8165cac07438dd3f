//! Standalone scheduled-work binary: runs the digest scheduler and the
//! event retention sweep. Deployed as exactly one instance; the digest
//! scheduler's single-flight guard is in-process only and does not
//! coordinate across replicas.

use std::sync::Arc;
use std::time::Duration;

use gitpulse_events::categorize::PrCategorizer;
use gitpulse_events::digest::DigestScheduler;
use gitpulse_events::dispatch::EmailConfig;
use gitpulse_events::tokens::OauthConfig;
use gitpulse_events::{retention, Dispatcher, StoredTokenService};
use gitpulse_github::GithubClient;
use gitpulse_slack::SlackClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gitpulse_worker=debug,gitpulse_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = gitpulse_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    gitpulse_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    gitpulse_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Clients and services ---
    let slack_bot_token = std::env::var("SLACK_BOT_TOKEN").unwrap_or_default();
    let tokens = Arc::new(StoredTokenService::new(pool.clone(), OauthConfig::from_env()));
    let categorizer = Arc::new(PrCategorizer::new(Arc::new(GithubClient::new()), tokens));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(SlackClient::new()),
        slack_bot_token,
        EmailConfig::from_env(),
    ));

    // --- Background services ---
    let cancel = tokio_util::sync::CancellationToken::new();

    let scheduler = DigestScheduler::new(pool.clone(), categorizer, dispatcher);
    let scheduler_cancel = cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_cancel).await;
    });

    let retention_handle = tokio::spawn(retention::run(pool.clone(), cancel.clone()));

    tracing::info!("Worker started (digest scheduler, event retention)");

    shutdown_signal().await;

    // --- Graceful shutdown ---
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), scheduler_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
