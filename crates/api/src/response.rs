//! Shared response types for API handlers.

use serde::Serialize;

/// Response body for the webhook endpoint, matching the provider-facing
/// contract: `{message, deliveryId, eventType}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub message: String,
    pub delivery_id: String,
    pub event_type: String,
}
