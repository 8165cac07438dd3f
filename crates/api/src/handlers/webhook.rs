//! Inbound webhook endpoint.
//!
//! The raw body is extracted as bytes because signature verification must
//! run over exactly what the provider signed, before any JSON parsing.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use gitpulse_events::ingest::IngestOutcome;

use crate::error::{AppError, AppResult};
use crate::response::WebhookResponse;
use crate::state::AppState;

/// POST /webhooks/github
///
/// Headers: `X-GitHub-Event` (event type), `X-GitHub-Delivery` (delivery
/// id), `X-Hub-Signature-256` (`sha256=<hex>`). Returns 200 for stored,
/// handled, and skipped deliveries; 400 for missing headers or a bad
/// signature; 500 only when storage fails.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let event_type = required_header(&headers, "x-github-event")?;
    let delivery_id = required_header(&headers, "x-github-delivery")?;
    let signature = required_header(&headers, "x-hub-signature-256")?;

    let outcome = state
        .processor
        .process(&event_type, &delivery_id, &signature, &body)
        .await?;

    let message = match outcome {
        IngestOutcome::Stored(event) => {
            // Fan out to relevant users before acknowledging; per-user
            // failures are contained inside the engine.
            let summary = state.engine.process_event(&event).await?;
            tracing::debug!(
                event_id = event.id,
                notified = summary.notified,
                "Webhook delivery processed"
            );
            "Event processed".to_string()
        }
        IngestOutcome::Handled(what) => format!("Handled: {what}"),
        IngestOutcome::Skipped(reason) => format!("Skipped: {reason}"),
    };

    Ok(Json(WebhookResponse {
        message,
        delivery_id,
        event_type,
    }))
}

/// Extract a required header as a string, or fail with 400.
fn required_header(headers: &HeaderMap, name: &'static str) -> Result<String, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .ok_or_else(|| AppError::BadRequest(format!("Missing required header: {name}")))
}
