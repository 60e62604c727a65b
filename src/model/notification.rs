use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::event::Event;

/// The envelope delivered to webhooks and WebSocket clients (§6,
/// "Notification envelope").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub subscription_id: String,
    pub subscription_name: String,
    pub event: Event,
    #[serde(with = "time::serde::rfc3339")]
    pub matched_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_results: Option<Vec<Value>>,
}
