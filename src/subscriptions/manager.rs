//! Subscription registration and persistence (§4.7).
//!
//! Subscriptions are cached in memory for fast dispatch-time matching and
//! persisted as `Subscription`-typed nodes through the same
//! [`GraphCore`]/[`StorageDriver`](crate::storage::StorageDriver) path as
//! any other node, rather than a separate bespoke store — there is no
//! global subscription singleton (§9, "Global subscription cache"): the
//! caller owns one `SubscriptionManager` and shares it.

use super::pattern::validate_stored_query;
use crate::cancel::CancelSignal;
use crate::error::{GraphError, Result};
use crate::graph::GraphCore;
use crate::model::{
    NewSubscription, Subscription, SubscriptionUpdate, SUBSCRIPTION_ID_PREFIX, SUBSCRIPTION_NODE_TYPE,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use time::OffsetDateTime;

pub struct SubscriptionManager {
    graph: GraphCore,
    cache: RwLock<BTreeMap<String, Subscription>>,
}

impl SubscriptionManager {
    pub fn new(graph: GraphCore) -> Self {
        Self {
            graph,
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    /// Populates the in-memory cache from persisted `Subscription` nodes;
    /// call once at startup before dispatching events.
    pub async fn load(&self) -> Result<()> {
        let query = crate::graph::FilterQuery::new()
            .with_types(vec![SUBSCRIPTION_NODE_TYPE.to_string()])
            .with_page(usize::MAX, 0);
        let cancel = CancelSignal::inert();
        let nodes = self.graph.filter_nodes(&query, &cancel).await?;
        let mut cache = self.cache.write();
        for node in nodes {
            match serde_json::from_value::<Subscription>(serde_json::Value::Object(node.properties)) {
                Ok(sub) => {
                    cache.insert(sub.id.clone(), sub);
                }
                Err(e) => {
                    tracing::warn!(node_id = %node.id, error = %e, "skipping malformed subscription node");
                }
            }
        }
        Ok(())
    }

    /// `Register(sub)` (§4.7): validates the pattern (including a stored
    /// query, if present), mints an id, persists it as a node, and caches
    /// it for dispatch.
    pub async fn register(&self, new: NewSubscription) -> Result<Subscription> {
        Subscription::validate_new(&new)?;
        if let Some(query) = &new.pattern.stored_query {
            validate_stored_query(query)?;
            if !self.graph.supports_stored_queries() {
                return Err(GraphError::UnsupportedQuery);
            }
        }

        let now = OffsetDateTime::now_utc();
        let sub = Subscription::new(new, now);
        self.persist(&sub, &CancelSignal::inert()).await?;
        self.cache.write().insert(sub.id.clone(), sub.clone());
        Ok(sub)
    }

    /// `Update(id, Δ)` (§4.7): re-validates any replaced pattern, persists
    /// the new version, and refreshes the cache entry.
    pub async fn update(&self, id: &str, update: SubscriptionUpdate) -> Result<Subscription> {
        if let Some(pattern) = &update.pattern {
            if let Some(query) = &pattern.stored_query {
                validate_stored_query(query)?;
                if !self.graph.supports_stored_queries() {
                    return Err(GraphError::UnsupportedQuery);
                }
            }
        }

        let mut sub = self.get(id)?;
        let now = OffsetDateTime::now_utc();
        sub.apply_update(update, now);
        self.persist(&sub, &CancelSignal::inert()).await?;
        self.cache.write().insert(sub.id.clone(), sub.clone());
        Ok(sub)
    }

    /// `Unregister(id)` (§4.7): removes the persisted node and the cache
    /// entry. Not an error if already absent.
    pub async fn unregister(&self, id: &str) -> Result<()> {
        self.cache.write().remove(id);
        let cancel = CancelSignal::inert();
        match self.graph.delete_node(id, true, &cancel).await {
            Ok(()) | Err(GraphError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn get(&self, id: &str) -> Result<Subscription> {
        self.cache
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(id.to_string()))
    }

    pub fn list(&self) -> Vec<Subscription> {
        self.cache.read().values().cloned().collect()
    }

    pub fn enabled_subscriptions(&self) -> Vec<Subscription> {
        self.cache.read().values().filter(|s| s.enabled).cloned().collect()
    }

    /// Updates `last_fired`/`fire_count` after a successful dispatch
    /// (§4.5) and persists the change.
    pub async fn record_fire(&self, id: &str) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let sub = {
            let mut cache = self.cache.write();
            let Some(sub) = cache.get_mut(id) else {
                return Ok(());
            };
            sub.record_fire(now);
            sub.clone()
        };
        self.persist(&sub, &CancelSignal::inert()).await
    }

    async fn persist(&self, sub: &Subscription, cancel: &CancelSignal) -> Result<()> {
        let value = serde_json::to_value(sub).map_err(GraphError::Serialization)?;
        let serde_json::Value::Object(properties) = value else {
            return Err(GraphError::Internal("subscription did not serialize to an object".into()));
        };

        if self.graph.get_node(&sub.id).await.is_ok() {
            let mut delta = properties;
            delta.remove("id");
            self.graph
                .update_node_meta(&sub.id, delta, None, None, true, cancel)
                .await?;
        } else {
            self.graph
                .create_node(sub.id.clone(), SUBSCRIPTION_NODE_TYPE, Vec::new(), properties, cancel)
                .await?;
        }
        Ok(())
    }
}

/// Node id used by [`SubscriptionManager::persist`] always carries the
/// `subscription:` prefix (§6).
pub fn is_subscription_id(id: &str) -> bool {
    id.starts_with(SUBSCRIPTION_ID_PREFIX)
}
