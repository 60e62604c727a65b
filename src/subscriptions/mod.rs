//! The standing-subscription engine (§4.4–§4.7): pattern matching, stored
//! registration, and webhook/WebSocket delivery of matched events.

mod dispatcher;
mod manager;
mod notifier;
mod pattern;

pub use dispatcher::SubscriptionDispatcher;
pub use manager::{is_subscription_id, SubscriptionManager};
pub use notifier::{WebSocketRegistry, WebhookNotifier};
pub use pattern::{matches_simple_criteria, validate_stored_query};
