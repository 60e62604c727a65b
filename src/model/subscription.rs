use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::event::EventType;

/// Id prefix for subscriptions persisted as `Subscription`-typed nodes (§6,
/// "Persisted subscription layout").
pub const SUBSCRIPTION_ID_PREFIX: &str = "subscription:";
pub const SUBSCRIPTION_NODE_TYPE: &str = "Subscription";

/// Simple criteria plus an optional stored query (§4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionPattern {
    #[serde(default)]
    pub event_types: Vec<EventType>,
    #[serde(default)]
    pub node_types: Vec<String>,
    #[serde(default)]
    pub link_types: Vec<String>,
    #[serde(default)]
    pub meta_match: std::collections::BTreeMap<String, serde_json::Value>,
    /// Opaque read-only stored query in the storage driver's dialect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub pattern: SubscriptionPattern,
    #[serde(default)]
    pub webhook: String,
    #[serde(default)]
    pub websocket: bool,
    pub enabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_fired: Option<OffsetDateTime>,
    #[serde(default)]
    pub fire_count: u64,
}

/// Fields accepted by `Register` (§4.7): a freshly minted subscription has
/// no id, fire history, or timestamps yet.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub name: String,
    pub description: String,
    pub pattern: SubscriptionPattern,
    pub webhook: String,
    pub websocket: bool,
}

/// Fields accepted by `Update` (§4.7): every field is optional so callers
/// only send what changed.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub pattern: Option<SubscriptionPattern>,
    pub webhook: Option<String>,
    pub websocket: Option<bool>,
    pub enabled: Option<bool>,
}

impl Subscription {
    pub fn new(new: NewSubscription, now: OffsetDateTime) -> Self {
        Self {
            id: format!("{SUBSCRIPTION_ID_PREFIX}{}", Uuid::new_v4()),
            name: new.name,
            description: new.description,
            pattern: new.pattern,
            webhook: new.webhook,
            websocket: new.websocket,
            enabled: true,
            created: now,
            modified: now,
            last_fired: None,
            fire_count: 0,
        }
    }

    pub fn apply_update(&mut self, update: SubscriptionUpdate, now: OffsetDateTime) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(pattern) = update.pattern {
            self.pattern = pattern;
        }
        if let Some(webhook) = update.webhook {
            self.webhook = webhook;
        }
        if let Some(websocket) = update.websocket {
            self.websocket = websocket;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        self.modified = now;
    }

    pub fn record_fire(&mut self, now: OffsetDateTime) {
        self.last_fired = Some(now);
        self.fire_count += 1;
    }

    /// `Register` validation (§4.7): name non-empty, at least one delivery
    /// mechanism configured.
    pub fn validate_new(new: &NewSubscription) -> crate::error::Result<()> {
        if new.name.trim().is_empty() {
            return Err(crate::error::GraphError::InvalidArgument(
                "subscription name must not be empty".into(),
            ));
        }
        if new.webhook.trim().is_empty() && !new.websocket {
            return Err(crate::error::GraphError::InvalidArgument(
                "subscription must configure a webhook, websocket delivery, or both".into(),
            ));
        }
        Ok(())
    }
}
