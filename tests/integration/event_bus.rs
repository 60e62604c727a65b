//! The event bus's non-blocking, bounded-capacity contract (§4.5, §8
//! invariant 8): writers never block, and every successful mutation either
//! enqueues exactly one event or is dropped and counted.

use memex::cancel::CancelSignal;
use memex::config::Config;
use memex::events::EventBus;
use memex::storage::memory::MemoryStore;
use memex::GraphCore;
use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;

fn graph_with_capacity(capacity: usize) -> (GraphCore, memex::events::EventReceiver) {
    let (bus, rx) = EventBus::new(capacity);
    let graph = GraphCore::new(Arc::new(MemoryStore::new()), bus, Config::default());
    (graph, rx)
}

#[tokio::test]
async fn writes_never_block_even_with_no_consumer() {
    // Capacity 2, no one ever drains the receiver: every CreateNode must
    // still return promptly rather than hang on a full channel.
    let (graph, _rx) = graph_with_capacity(2);
    let cancel = CancelSignal::inert();

    for i in 0..10 {
        let result = tokio::time::timeout(
            Duration::from_millis(500),
            graph.create_node(format!("n{i}"), "Note", vec![], Map::new(), &cancel),
        )
        .await;
        assert!(result.is_ok(), "create_node must not block on a full event bus");
        assert!(result.unwrap().is_ok());
    }

    assert_eq!(graph.events_dropped(), 8);
}

#[tokio::test]
async fn every_mutation_enqueues_or_is_counted_as_dropped() {
    let (graph, mut rx) = graph_with_capacity(1000);
    let cancel = CancelSignal::inert();

    graph.create_node("a", "T", vec![], Map::new(), &cancel).await.unwrap();
    graph.create_node("b", "T", vec![], Map::new(), &cancel).await.unwrap();
    graph.create_link("a", "b", "REL", Map::new(), &cancel).await.unwrap();
    graph.delete_link("a", "b", "REL", &cancel).await.unwrap();
    graph.delete_node("a", false, &cancel).await.unwrap();

    let mut received = 0;
    while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
        received += 1;
    }
    assert_eq!(received + graph.events_dropped() as usize, 5);
    assert_eq!(graph.events_dropped(), 0);
}

#[tokio::test]
async fn dropped_events_are_observable_via_a_counter_not_an_error() {
    let (graph, _rx) = graph_with_capacity(1);
    let cancel = CancelSignal::inert();

    // Fill the single buffer slot, then push past capacity; the mutation
    // itself must still succeed even though its event gets dropped.
    graph.create_node("a", "T", vec![], Map::new(), &cancel).await.unwrap();
    let overflow = graph.create_node("b", "T", vec![], Map::new(), &cancel).await;
    assert!(overflow.is_ok());
    assert!(graph.events_dropped() >= 1);
}
