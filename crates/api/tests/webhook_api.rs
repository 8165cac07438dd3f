//! End-to-end tests for the webhook ingest endpoint: signature handling,
//! relevance filtering, notification fan-out, and redelivery idempotence.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{
    body_json, insert_user, post_signed_webhook, post_webhook, track_repository,
};
use sqlx::PgPool;

/// A minimal `pull_request` opened payload for repository 42.
fn pr_opened_payload(author: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "action": "opened",
        "repository": { "id": 42, "full_name": "acme/widgets" },
        "sender": { "id": 900, "login": author, "type": "User" },
        "pull_request": {
            "id": 777,
            "number": 5,
            "title": "Add rate limiting",
            "html_url": "https://example.test/pr/5",
            "state": "open",
            "draft": false,
            "user": { "id": 900, "login": author },
            "requested_reviewers": [],
            "assignees": [],
            "labels": [],
        },
    }))
    .unwrap()
}

async fn event_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM webhook_events")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn notification_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications")
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_headers_are_rejected_with_400(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    // No delivery/signature headers at all.
    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .method(axum::http::Method::POST)
            .uri("/webhooks/github")
            .body(axum::body::Body::from("{}"))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(event_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_signature_is_rejected_with_400(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = pr_opened_payload("alice");

    let response = post_webhook(
        app,
        "pull_request",
        "delivery-bad-sig",
        "sha256=0000000000000000000000000000000000000000000000000000000000000000",
        &body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_SIGNATURE");
    assert_eq!(event_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn tampered_body_fails_verification(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = pr_opened_payload("alice");

    // Sign one body, send another.
    let sig = gitpulse_core::signature::compute_signature(&body, common::TEST_SECRET);
    let header = gitpulse_core::signature::format_signature_header(&sig);
    let mut tampered = body.clone();
    tampered[0] ^= 0x01;

    let response = post_webhook(app, "pull_request", "delivery-tampered", &header, &tampered).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(event_count(&pool).await, 0);
}

// ---------------------------------------------------------------------------
// Relevance filtering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn valid_push_event_is_skipped_without_storing(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = serde_json::to_vec(&serde_json::json!({
        "ref": "refs/heads/main",
        "repository": { "id": 42, "full_name": "acme/widgets" },
        "sender": { "id": 900, "login": "alice", "type": "User" },
    }))
    .unwrap();

    let response = post_signed_webhook(app, "push", "delivery-push", &body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().starts_with("Skipped"));
    assert_eq!(json["deliveryId"], "delivery-push");
    assert_eq!(json["eventType"], "push");
    assert_eq!(event_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn bot_sender_is_skipped(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = serde_json::to_vec(&serde_json::json!({
        "action": "opened",
        "repository": { "id": 42, "full_name": "acme/widgets" },
        "sender": { "id": 901, "login": "dependabot[bot]", "type": "Bot" },
    }))
    .unwrap();

    let response = post_signed_webhook(app, "pull_request", "delivery-bot", &body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("bot sender"));
    assert_eq!(event_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn membership_event_updates_the_mirror_without_storing(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = serde_json::to_vec(&serde_json::json!({
        "action": "added",
        "team": { "slug": "platform" },
        "member": { "id": 902, "login": "carol" },
        "sender": { "id": 1, "login": "svc-bot", "type": "Bot" },
    }))
    .unwrap();

    let response = post_signed_webhook(app, "membership", "delivery-membership", &body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(event_count(&pool).await, 0);

    let members = gitpulse_db::repositories::TeamMemberRepo::list_logins(&pool, "platform")
        .await
        .unwrap();
    assert_eq!(members, vec!["carol".to_string()]);
}

// ---------------------------------------------------------------------------
// Fan-out and idempotence
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn stored_event_notifies_tracking_users_but_not_the_actor(pool: PgPool) {
    let alice = insert_user(&pool, "alice").await;
    let bob = insert_user(&pool, "bob").await;
    track_repository(&pool, alice, 42, "acme/widgets").await;
    track_repository(&pool, bob, 42, "acme/widgets").await;

    let app = common::build_test_app(pool.clone());
    let response =
        post_signed_webhook(app, "pull_request", "delivery-pr-1", &pr_opened_payload("alice"))
            .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(event_count(&pool).await, 1);

    // The event is marked processed once the fan-out completes.
    let processed: bool =
        sqlx::query_scalar("SELECT processed FROM webhook_events WHERE delivery_id = $1")
            .bind("delivery-pr-1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(processed);

    // Only bob is notified; alice acted herself. The Slack endpoint is
    // unreachable in tests, so the row exists but stays undelivered.
    let rows: Vec<(i64, Option<String>)> =
        sqlx::query_as("SELECT user_id, message_ts FROM notifications")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, bob);
    assert_matches!(rows[0].1, None);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn redelivery_of_processed_event_creates_no_duplicates(pool: PgPool) {
    let bob = insert_user(&pool, "bob").await;
    track_repository(&pool, bob, 42, "acme/widgets").await;

    let body = pr_opened_payload("alice");

    let first = post_signed_webhook(
        common::build_test_app(pool.clone()),
        "pull_request",
        "delivery-pr-dup",
        &body,
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    // The provider redelivers the same delivery id.
    let second = post_signed_webhook(
        common::build_test_app(pool.clone()),
        "pull_request",
        "delivery-pr-dup",
        &body,
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);

    assert_eq!(event_count(&pool).await, 1);
    assert_eq!(notification_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn pull_request_event_refreshes_the_mirror(pool: PgPool) {
    let bob = insert_user(&pool, "bob").await;
    track_repository(&pool, bob, 42, "acme/widgets").await;

    let app = common::build_test_app(pool.clone());
    post_signed_webhook(app, "pull_request", "delivery-pr-mirror", &pr_opened_payload("alice"))
        .await;

    let mirrored = gitpulse_db::repositories::PullRequestRepo::find_by_repo_and_number(&pool, 42, 5)
        .await
        .unwrap()
        .expect("mirror row exists");
    assert_eq!(mirrored.title, "Add rate limiting");
    assert_eq!(mirrored.author_login, "alice");
    assert_eq!(mirrored.state, "open");
}
