//! Liveness and readiness probe.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// GET /health
///
/// Reports process liveness and database reachability. Always 200; a
/// broken database shows up as `db_healthy: false` so load balancers can
/// distinguish "up but degraded" from "down".
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_healthy = gitpulse_db::health_check(&state.pool).await.is_ok();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "db_healthy": db_healthy,
    }))
}
