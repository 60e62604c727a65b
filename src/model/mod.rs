//! Data models for graph entities, events, and subscriptions (§3).
//!
//! Mirrors the reference storage crate's `model.rs` in spirit — plain,
//! `serde`-derived structs with no storage-layer dependency — but widened to
//! the versioned, event-driven domain this service covers.

mod event;
mod link;
mod node;
mod notification;
mod subscription;

pub use event::{Event, EventType};
pub use link::{AttentionFields, Link, ATTENDED};
pub use node::Node;
pub use notification::Notification;
pub use subscription::{
    NewSubscription, Subscription, SubscriptionPattern, SubscriptionUpdate,
    SUBSCRIPTION_ID_PREFIX, SUBSCRIPTION_NODE_TYPE,
};
