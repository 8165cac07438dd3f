use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Webhook ingest route.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/github", post(handlers::webhook::receive_webhook))
}
