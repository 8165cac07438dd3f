//! Integration tests for the digest scheduler's matching, audit, and
//! already-sent-today behavior.
//!
//! These run against a real database via `#[sqlx::test]`. The GitHub and
//! Slack clients point at an unroutable address; every path exercised
//! here finishes before any API call would be made (no tracked
//! repositories → empty buckets → nothing to deliver).

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use gitpulse_db::repositories::UserDigestRepo;
use gitpulse_events::categorize::PrCategorizer;
use gitpulse_events::digest::DigestScheduler;
use gitpulse_events::{Dispatcher, StoredTokenService};
use gitpulse_github::GithubClient;
use gitpulse_slack::SlackClient;
use sqlx::PgPool;

fn scheduler(pool: PgPool) -> DigestScheduler {
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

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
        .and_utc()
}

async fn insert_user(pool: &PgPool, github_login: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (slack_user_id, github_login, github_access_token) \
         VALUES ($1, $2, 'token') RETURNING id",
    )
    .bind(format!("U-{github_login}"))
    .bind(github_login)
    .fetch_one(pool)
    .await
    .expect("insert user")
}

async fn insert_config(
    pool: &PgPool,
    user_id: i64,
    deliver_at: &str,
    weekdays: &[i16],
    enabled: bool,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO digest_configs \
            (user_id, name, enabled, deliver_at, timezone, weekdays) \
         VALUES ($1, 'Morning digest', $2, $3, 'UTC', $4) RETURNING id",
    )
    .bind(user_id)
    .bind(enabled)
    .bind(deliver_at)
    .bind(weekdays)
    .fetch_one(pool)
    .await
    .expect("insert config")
}

// ---------------------------------------------------------------------------
// Matching and audit rows
// ---------------------------------------------------------------------------

// 2026-08-05 is a Wednesday (weekday 3, Sunday-based).

#[sqlx::test(migrations = "../db/migrations")]
async fn due_config_with_nothing_to_send_records_empty_run(pool: PgPool) {
    let user_id = insert_user(&pool, "alice").await;
    let config_id = insert_config(&pool, user_id, "09:00", &[3], true).await;

    let summary = scheduler(pool.clone()).run_once(utc(2026, 8, 5, 9, 7)).await;

    assert_eq!(summary.total, 1);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.errors, 0);

    // The handled run is recorded with zero counts and no message id.
    let digests = UserDigestRepo::list_for_config(&pool, config_id, 10)
        .await
        .unwrap();
    assert_eq!(digests.len(), 1);
    assert_eq!(digests[0].pr_count, 0);
    assert!(digests[0].message_ts.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_tick_same_day_is_already_sent(pool: PgPool) {
    let user_id = insert_user(&pool, "alice").await;
    let config_id = insert_config(&pool, user_id, "09:00", &[3], true).await;

    let sched = scheduler(pool.clone());
    sched.run_once(utc(2026, 8, 5, 9, 0)).await;
    // The 09:07 tick floors into the same quarter-hour and matches again,
    // but the audit row from 09:00 suppresses it.
    let second = sched.run_once(utc(2026, 8, 5, 9, 7)).await;

    assert_eq!(second.matched, 1);
    assert_eq!(second.already_sent, 1);
    assert_eq!(second.empty, 0);

    let digests = UserDigestRepo::list_for_config(&pool, config_id, 10)
        .await
        .unwrap();
    assert_eq!(digests.len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn off_schedule_tick_does_not_match(pool: PgPool) {
    let user_id = insert_user(&pool, "alice").await;
    let config_id = insert_config(&pool, user_id, "09:00", &[3], true).await;

    // 09:15 floors to 09:15, not 09:00.
    let wrong_time = scheduler(pool.clone()).run_once(utc(2026, 8, 5, 9, 15)).await;
    assert_eq!(wrong_time.matched, 0);

    // Right time, wrong weekday (Thursday against a Wednesday config).
    let wrong_day = scheduler(pool.clone()).run_once(utc(2026, 8, 6, 9, 0)).await;
    assert_eq!(wrong_day.matched, 0);

    let digests = UserDigestRepo::list_for_config(&pool, config_id, 10)
        .await
        .unwrap();
    assert!(digests.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn disabled_config_is_never_considered(pool: PgPool) {
    let user_id = insert_user(&pool, "alice").await;
    insert_config(&pool, user_id, "09:00", &[3], false).await;

    let summary = scheduler(pool.clone()).run_once(utc(2026, 8, 5, 9, 0)).await;

    assert_eq!(summary.total, 0);
    assert_eq!(summary.matched, 0);
}

// ---------------------------------------------------------------------------
// The local-day window
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn yesterdays_late_digest_does_not_block_today(pool: PgPool) {
    let user_id = insert_user(&pool, "alice").await;
    let config_id = insert_config(&pool, user_id, "09:00", &[2, 3], true).await;

    // A digest sent at 23:59 the previous local day (Tuesday).
    sqlx::query(
        "INSERT INTO user_digests (config_id, user_id, sent_at, delivery_type) \
         VALUES ($1, $2, $3, 'dm')",
    )
    .bind(config_id)
    .bind(user_id)
    .bind(utc(2026, 8, 4, 23, 59))
    .execute(&pool)
    .await
    .unwrap();

    // Wednesday's 09:00 tick still runs: yesterday's row is outside
    // today's [midnight, midnight) window.
    let summary = scheduler(pool.clone()).run_once(utc(2026, 8, 5, 9, 0)).await;
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.already_sent, 0);
    assert_eq!(summary.empty, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn early_morning_digest_blocks_the_rest_of_the_day(pool: PgPool) {
    let user_id = insert_user(&pool, "alice").await;
    let config_id = insert_config(&pool, user_id, "09:00", &[3], true).await;

    // Sent at 00:01 local the same day (e.g. by an earlier midnight
    // config window).
    sqlx::query(
        "INSERT INTO user_digests (config_id, user_id, sent_at, delivery_type) \
         VALUES ($1, $2, $3, 'dm')",
    )
    .bind(config_id)
    .bind(user_id)
    .bind(utc(2026, 8, 5, 0, 1))
    .execute(&pool)
    .await
    .unwrap();

    let summary = scheduler(pool.clone()).run_once(utc(2026, 8, 5, 9, 0)).await;
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.already_sent, 1);
}
