//! Fans events off the event bus to matching subscriptions' webhook and
//! WebSocket deliveries (§4.5).

use super::manager::SubscriptionManager;
use super::notifier::{WebSocketRegistry, WebhookNotifier};
use super::pattern::matches_simple_criteria;
use crate::events::EventReceiver;
use crate::graph::GraphCore;
use crate::model::{Event, Notification, Subscription};
use crate::storage::QueryOutcome;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info};

pub struct SubscriptionDispatcher {
    graph: GraphCore,
    manager: Arc<SubscriptionManager>,
    webhook: Arc<WebhookNotifier>,
    websocket: Arc<WebSocketRegistry>,
}

impl SubscriptionDispatcher {
    pub fn new(
        graph: GraphCore,
        manager: Arc<SubscriptionManager>,
        websocket: Arc<WebSocketRegistry>,
    ) -> Self {
        let config = graph.config().clone();
        Self {
            graph,
            manager,
            webhook: Arc::new(WebhookNotifier::new(
                config.webhook_timeout_secs,
                config.webhook_max_attempts,
            )),
            websocket,
        }
    }

    /// Drains `events` until the sender side (the [`crate::events::EventBus`])
    /// is dropped. Intended to run as a standalone background task — one
    /// dispatcher per process, fed by the graph core's event bus (§2, "Data
    /// flow of a write"). Matching subscriptions are dispatched one
    /// `tokio::spawn`ed task each (§4.5, "fan-outs to all enabled
    /// subscriptions concurrently"), so a slow or hanging webhook endpoint
    /// for one subscription can't stall delivery to the others or delay the
    /// next `events.recv()`. Once the channel closes, `run` waits for every
    /// still-in-flight dispatch task before returning (§5, "waits for
    /// outstanding worker tasks").
    pub async fn run(&self, mut events: EventReceiver) {
        let mut tasks = tokio::task::JoinSet::new();
        while let Some(event) = events.recv().await {
            for sub in self.manager.enabled_subscriptions() {
                if !matches_simple_criteria(&sub.pattern, &event) {
                    continue;
                }

                let graph = self.graph.clone();
                let manager = Arc::clone(&self.manager);
                let webhook = Arc::clone(&self.webhook);
                let websocket = Arc::clone(&self.websocket);
                let event = event.clone();
                tasks.spawn(async move {
                    Self::dispatch_one(&graph, &manager, &webhook, &websocket, sub, event).await;
                });
            }
            // Reap completed deliveries as we go rather than only at
            // shutdown, so a long-running bus doesn't pile up finished
            // JoinHandles forever.
            while tasks.try_join_next().is_some() {}
        }
        while tasks.join_next().await.is_some() {}
    }

    /// Evaluates the stored query (if any) and delivers to webhook/WebSocket
    /// for a single subscription/event pair. Runs in its own spawned task so
    /// its up-to-30s webhook timeout never blocks sibling subscriptions or
    /// the event-bus drain loop.
    async fn dispatch_one(
        graph: &GraphCore,
        manager: &SubscriptionManager,
        webhook: &WebhookNotifier,
        websocket: &WebSocketRegistry,
        sub: Subscription,
        event: Event,
    ) {
        // A stored query is a second, storage-backed match gate (§4.4 step
        // 4): the subscription only fires once the simple criteria pass AND
        // the query returns >= 1 row.
        let query_results = match &sub.pattern.stored_query {
            Some(query) => match graph.execute_stored_query(query, &event).await {
                Ok(QueryOutcome::Rows(rows)) if !rows.is_empty() => Some(rows),
                Ok(QueryOutcome::Rows(_)) => return,
                Ok(QueryOutcome::Unsupported) => {
                    error!(subscription_id = %sub.id, "stored query unsupported by storage driver at dispatch time");
                    return;
                }
                Err(e) => {
                    error!(subscription_id = %sub.id, error = %e, "stored query evaluation failed");
                    return;
                }
            },
            None => None,
        };

        let notification = Notification {
            subscription_id: sub.id.clone(),
            subscription_name: sub.name.clone(),
            event,
            matched_at: OffsetDateTime::now_utc(),
            query_results,
        };

        if !sub.webhook.is_empty() {
            let delivered = webhook.deliver(&sub.webhook, &notification).await;
            info!(subscription_id = %sub.id, delivered, "webhook notification attempted");
        }
        if sub.websocket {
            websocket.send(&sub.id, notification);
        }

        if let Err(e) = manager.record_fire(&sub.id).await {
            error!(subscription_id = %sub.id, error = %e, "failed to record subscription fire");
        }
    }
}
