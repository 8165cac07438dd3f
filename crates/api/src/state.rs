use std::sync::Arc;

use gitpulse_events::{DecisionEngine, WebhookProcessor};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`. Cheaply cloneable; inner data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gitpulse_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Webhook verification/storage pipeline.
    pub processor: Arc<WebhookProcessor>,
    /// Per-user notification decision engine.
    pub engine: Arc<DecisionEngine>,
}
