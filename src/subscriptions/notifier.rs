//! Delivery of matched notifications to webhooks and WebSocket clients
//! (§4.6).

use crate::model::Notification;
use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// POSTs a [`Notification`] to a subscription's webhook URL with
/// exponential backoff: attempts at 0s, 1s, 4s (attempt^2) up to
/// [`crate::config::Config::webhook_max_attempts`] tries, each bounded by
/// [`crate::config::Config::webhook_timeout_secs`].
pub struct WebhookNotifier {
    client: reqwest::Client,
    max_attempts: u32,
}

impl WebhookNotifier {
    pub fn new(timeout_secs: u64, max_attempts: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, max_attempts }
    }

    pub async fn deliver(&self, url: &str, notification: &Notification) -> bool {
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let backoff = Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(backoff).await;
            }
            let request = self
                .client
                .post(url)
                .header("X-Memex-Event", notification.event.event_type.as_str())
                .header("X-Memex-Subscription", &notification.subscription_id)
                .json(notification);
            match request.send().await {
                Ok(resp) if resp.status().is_success() => return true,
                Ok(resp) => warn!(
                    subscription_id = %notification.subscription_id,
                    status = %resp.status(),
                    attempt,
                    "webhook delivery rejected"
                ),
                Err(e) => warn!(
                    subscription_id = %notification.subscription_id,
                    error = %e,
                    attempt,
                    "webhook delivery failed"
                ),
            }
        }
        false
    }
}

/// Registry of live WebSocket clients, at most one per subscription (§4.6,
/// "single client per subscription"): a later registration replaces the
/// earlier one rather than fanning out to both.
#[derive(Default)]
pub struct WebSocketRegistry {
    clients: DashMap<String, mpsc::Sender<Notification>>,
}

impl WebSocketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, subscription_id: impl Into<String>, sender: mpsc::Sender<Notification>) {
        self.clients.insert(subscription_id.into(), sender);
    }

    pub fn unregister(&self, subscription_id: &str) {
        self.clients.remove(subscription_id);
    }

    /// Best-effort, non-blocking send. A send error (backed-up or closed
    /// channel) unregisters the client — the subscription stays active, it
    /// just has no connected pusher until the next registration (§4.6).
    pub fn send(&self, subscription_id: &str, notification: Notification) -> bool {
        let Some(sender) = self.clients.get(subscription_id) else {
            return false;
        };
        match sender.try_send(notification) {
            Ok(()) => true,
            Err(e) => {
                warn!(subscription_id, error = %e, "websocket notification dropped, unregistering client");
                drop(sender);
                self.clients.remove(subscription_id);
                false
            }
        }
    }
}
