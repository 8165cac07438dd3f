use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use gitpulse_api::config::ServerConfig;
use gitpulse_api::routes;
use gitpulse_api::state::AppState;
use gitpulse_core::signature;
use gitpulse_events::{
    DecisionEngine, Dispatcher, PreferenceProfileMatcher, WebhookProcessor,
};
use gitpulse_slack::SlackClient;

/// The webhook secret every test app is configured with.
pub const TEST_SECRET: &[u8] = b"test-webhook-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        webhook_secret: Some(String::from_utf8(TEST_SECRET.to_vec()).unwrap()),
        slack_bot_token: "xoxb-test".to_string(),
    }
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same stack production uses. The Slack client points at an
/// unroutable address: sends fail fast and notifications stay in the
/// "created but undelivered" state, which is what the assertions check.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let processor = Arc::new(WebhookProcessor::new(
        pool.clone(),
        config.webhook_secret.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(SlackClient::with_api_base("http://127.0.0.1:1")),
        config.slack_bot_token.clone(),
        None,
    ));
    let engine = Arc::new(DecisionEngine::new(
        pool.clone(),
        dispatcher,
        Arc::new(PreferenceProfileMatcher),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config),
        processor,
        engine,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .merge(routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds"),
    )
    .await
    .expect("request succeeds")
}

/// POST a webhook delivery with a valid signature over `body`.
pub async fn post_signed_webhook(
    app: Router,
    event_type: &str,
    delivery_id: &str,
    body: &[u8],
) -> Response {
    let sig = signature::compute_signature(body, TEST_SECRET);
    let header = signature::format_signature_header(&sig);
    post_webhook(app, event_type, delivery_id, &header, body).await
}

/// POST a webhook delivery with an explicit signature header.
pub async fn post_webhook(
    app: Router,
    event_type: &str,
    delivery_id: &str,
    signature_header: &str,
    body: &[u8],
) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri("/webhooks/github")
            .header("x-github-event", event_type)
            .header("x-github-delivery", delivery_id)
            .header("x-hub-signature-256", signature_header)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_vec()))
            .expect("request builds"),
    )
    .await
    .expect("request succeeds")
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Insert a user row, returning its id.
pub async fn insert_user(pool: &PgPool, github_login: &str) -> i64 {
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

/// Make a user track a repository.
pub async fn track_repository(pool: &PgPool, user_id: i64, repository_id: i64, full_name: &str) {
    sqlx::query(
        "INSERT INTO tracked_repositories (user_id, repository_id, full_name) \
         VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(repository_id)
    .bind(full_name)
    .execute(pool)
    .await
    .expect("track repository");
}
