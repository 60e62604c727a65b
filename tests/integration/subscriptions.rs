//! Subscription registration, pattern matching, and dispatch end-to-end
//! (§4.4–§4.7).

use memex::config::Config;
use memex::events::EventBus;
use memex::model::{EventType, NewSubscription, SubscriptionPattern, SubscriptionUpdate};
use memex::storage::memory::MemoryStore;
use memex::GraphCore;
use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;

use memex::cancel::CancelSignal;
use memex::subscriptions::{SubscriptionDispatcher, SubscriptionManager, WebSocketRegistry};

fn graph_and_bus(capacity: usize) -> (GraphCore, EventBus, memex::events::EventReceiver) {
    let (bus, rx) = EventBus::new(capacity);
    let graph = GraphCore::new(Arc::new(MemoryStore::new()), bus.clone(), Config::default());
    (graph, bus, rx)
}

/// A thin wrapper over [`MemoryStore`] that reports a read-query engine
/// and answers `MATCH .. RETURN n` with one row iff `node_id` was bound —
/// just enough to exercise the §4.4 step-4 match gate without a real
/// query dialect.
mod query_capable {
    use async_trait::async_trait;
    use memex::storage::memory::MemoryStore;
    use memex::storage::QueryOutcome;
    use std::collections::BTreeMap;

    #[derive(Default)]
    pub struct QueryCapableStore(pub MemoryStore);

    macro_rules! delegate {
        ($name:ident(&self $(, $arg:ident : $ty:ty)*) -> $ret:ty) => {
            async fn $name(&self $(, $arg: $ty)*) -> $ret {
                self.0.$name($($arg),*).await
            }
        };
    }

    #[async_trait]
    impl memex::storage::StorageDriver for QueryCapableStore {
        delegate!(create_node(&self, node: memex::model::Node) -> memex::error::Result<()>);
        delegate!(get_node_current(&self, id: &str) -> memex::error::Result<Option<memex::model::Node>>);
        delegate!(get_node_by_version(&self, id: &str, version: u64) -> memex::error::Result<Option<memex::model::Node>>);
        delegate!(get_node_at_time(&self, id: &str, at: time::OffsetDateTime) -> memex::error::Result<Option<memex::model::Node>>);
        delegate!(list_versions_of(&self, id: &str) -> memex::error::Result<Vec<memex::model::Node>>);
        delegate!(get_version_chain(&self, id: &str) -> memex::error::Result<Vec<memex::storage::ChainEntry>>);
        delegate!(delete_node_hard(&self, id: &str) -> memex::error::Result<BTreeMap<String, u64>>);
        delegate!(create_link(&self, link: memex::model::Link) -> memex::error::Result<()>);
        delegate!(delete_link(&self, source: &str, target: &str, link_type: &str) -> memex::error::Result<bool>);
        delegate!(get_links_from_source(&self, id: &str) -> memex::error::Result<Vec<memex::model::Link>>);
        delegate!(get_links_to_target(&self, id: &str) -> memex::error::Result<Vec<memex::model::Link>>);
        delegate!(list_all_links(&self) -> memex::error::Result<Vec<memex::model::Link>>);
        delegate!(delete_links(&self, keys: &[(String, String, String)]) -> memex::error::Result<u64>);
        delegate!(list_node_ids(&self) -> memex::error::Result<Vec<String>>);
        delegate!(search_by_text(&self, query: &str, limit: usize, offset: usize) -> memex::error::Result<memex::storage::SearchOutcome>);
        delegate!(filter_by_type_and_property_substring(&self, types: &[String], substring: Option<&str>, limit: usize, offset: usize) -> memex::error::Result<Vec<String>>);
        delegate!(traverse_outgoing(&self, start: &str, max_depth: u32, type_filter: &[String], limit: usize, offset: usize) -> memex::error::Result<Vec<String>>);
        delegate!(count_nodes_grouped_by_type(&self) -> memex::error::Result<BTreeMap<String, u64>>);
        delegate!(count_links_grouped_by_type(&self) -> memex::error::Result<BTreeMap<String, u64>>);
        delegate!(top_nodes_by_degree(&self, n: usize) -> memex::error::Result<Vec<(String, u64)>>);
        delegate!(sample_ids_by_type(&self, node_type: &str, n: usize) -> memex::error::Result<Vec<String>>);

        async fn insert_version(
            &self,
            previous_version_id: Option<&str>,
            new_node: memex::model::Node,
        ) -> memex::error::Result<()> {
            self.0.insert_version(previous_version_id, new_node).await
        }

        async fn update_link_properties(
            &self,
            source: &str,
            target: &str,
            link_type: &str,
            new_properties: serde_json::Map<String, serde_json::Value>,
            now: time::OffsetDateTime,
        ) -> memex::error::Result<()> {
            self.0.update_link_properties(source, target, link_type, new_properties, now).await
        }

        async fn execute_read_only_query(
            &self,
            text: &str,
            params: BTreeMap<String, serde_json::Value>,
        ) -> memex::error::Result<QueryOutcome> {
            let _ = text;
            if params.contains_key("node_id") {
                Ok(QueryOutcome::Rows(vec![serde_json::json!({"matched": true})]))
            } else {
                Ok(QueryOutcome::Rows(vec![]))
            }
        }

        fn supports_read_only_queries(&self) -> bool {
            true
        }
    }
}
use query_capable::QueryCapableStore;

#[tokio::test]
async fn register_validates_pattern_and_persists() {
    let (graph, _bus, _rx) = graph_and_bus(100);
    let manager = SubscriptionManager::new(graph);

    let sub = manager
        .register(NewSubscription {
            name: "concept-watch".to_string(),
            description: "notifies on new concepts".to_string(),
            pattern: SubscriptionPattern {
                event_types: vec![EventType::NodeCreated],
                node_types: vec!["Concept".to_string()],
                ..Default::default()
            },
            webhook: String::new(),
            websocket: true,
        })
        .await
        .unwrap();

    assert!(sub.enabled);
    assert_eq!(manager.list().len(), 1);
    assert_eq!(manager.get(&sub.id).unwrap().name, "concept-watch");
}

#[tokio::test]
async fn update_applies_delta_and_revalidates_stored_query() {
    let (graph, _bus, _rx) = graph_and_bus(100);
    let manager = SubscriptionManager::new(graph);

    let sub = manager
        .register(NewSubscription {
            name: "initial".to_string(),
            description: String::new(),
            pattern: SubscriptionPattern::default(),
            webhook: "https://example.test/hook".to_string(),
            websocket: false,
        })
        .await
        .unwrap();

    let mut bad_pattern = SubscriptionPattern::default();
    bad_pattern.stored_query = Some("MATCH (n) CREATE (m) RETURN n".to_string());
    let err = manager
        .update(
            &sub.id,
            SubscriptionUpdate {
                pattern: Some(bad_pattern),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "FORBIDDEN_QUERY");

    let updated = manager
        .update(
            &sub.id,
            SubscriptionUpdate {
                name: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "renamed");
}

#[tokio::test]
async fn dispatcher_delivers_matching_event_over_websocket() {
    let (graph, bus, rx) = graph_and_bus(100);
    let manager = Arc::new(SubscriptionManager::new(graph.clone()));
    let websocket = Arc::new(WebSocketRegistry::new());

    let sub = manager
        .register(NewSubscription {
            name: "ws-watch".to_string(),
            description: String::new(),
            pattern: SubscriptionPattern {
                event_types: vec![EventType::NodeCreated],
                ..Default::default()
            },
            webhook: String::new(),
            websocket: true,
        })
        .await
        .unwrap();

    let (tx, mut client_rx) = tokio::sync::mpsc::channel(8);
    websocket.register(sub.id.clone(), tx);

    let dispatcher = SubscriptionDispatcher::new(graph.clone(), manager.clone(), websocket.clone());
    let handle = tokio::spawn(async move { dispatcher.run(rx).await });

    let cancel = CancelSignal::inert();
    graph.create_node("n1", "Note", vec![], Map::new(), &cancel).await.unwrap();

    let notification = tokio::time::timeout(Duration::from_secs(2), client_rx.recv())
        .await
        .expect("dispatcher delivered a notification before timeout")
        .expect("channel stayed open");
    assert_eq!(notification.subscription_id, sub.id);
    assert_eq!(notification.event.node_id.as_deref(), Some("n1"));

    drop(bus);
    let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;

    assert_eq!(manager.get(&sub.id).unwrap().fire_count, 1);
}

#[tokio::test]
async fn non_matching_events_do_not_fire() {
    let (graph, bus, rx) = graph_and_bus(100);
    let manager = Arc::new(SubscriptionManager::new(graph.clone()));
    let websocket = Arc::new(WebSocketRegistry::new());

    let sub = manager
        .register(NewSubscription {
            name: "links-only".to_string(),
            description: String::new(),
            pattern: SubscriptionPattern {
                event_types: vec![EventType::LinkCreated],
                ..Default::default()
            },
            webhook: String::new(),
            websocket: true,
        })
        .await
        .unwrap();

    let dispatcher = SubscriptionDispatcher::new(graph.clone(), manager.clone(), websocket.clone());
    let handle = tokio::spawn(async move { dispatcher.run(rx).await });

    let cancel = CancelSignal::inert();
    graph.create_node("n1", "Note", vec![], Map::new(), &cancel).await.unwrap();

    drop(bus);
    let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;

    assert_eq!(manager.get(&sub.id).unwrap().fire_count, 0);
}

#[tokio::test]
async fn stored_query_gates_the_match_and_populates_query_results() {
    let (bus, rx) = EventBus::new(100);
    let graph = GraphCore::new(Arc::new(QueryCapableStore::default()), bus.clone(), Config::default());
    let manager = Arc::new(SubscriptionManager::new(graph.clone()));
    let websocket = Arc::new(WebSocketRegistry::new());

    let sub = manager
        .register(NewSubscription {
            name: "stored-query-watch".to_string(),
            description: String::new(),
            pattern: SubscriptionPattern {
                event_types: vec![EventType::NodeCreated],
                stored_query: Some("MATCH (n) RETURN n".to_string()),
                ..Default::default()
            },
            webhook: String::new(),
            websocket: true,
        })
        .await
        .unwrap();

    let (tx, mut client_rx) = tokio::sync::mpsc::channel(8);
    websocket.register(sub.id.clone(), tx);

    let dispatcher = SubscriptionDispatcher::new(graph.clone(), manager.clone(), websocket.clone());
    let handle = tokio::spawn(async move { dispatcher.run(rx).await });

    let cancel = CancelSignal::inert();
    // Every node.created event carries a node_id, so the fake query engine
    // always returns one row -- the subscription should fire.
    graph.create_node("n1", "Note", vec![], Map::new(), &cancel).await.unwrap();

    let notification = tokio::time::timeout(Duration::from_secs(2), client_rx.recv())
        .await
        .expect("dispatcher delivered a notification before timeout")
        .expect("channel stayed open");
    assert_eq!(notification.query_results.as_ref().map(Vec::len), Some(1));

    drop(bus);
    let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
}
