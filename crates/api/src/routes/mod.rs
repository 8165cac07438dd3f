//! Route registration, one module per route group.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod webhook;

/// All non-health routes.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(webhook::router())
}
