//! Graph traversal and subgraph extraction (§4.2, worked example in §8).

use memex::cancel::CancelSignal;
use memex::config::Config;
use memex::events::EventBus;
use memex::storage::memory::MemoryStore;
use memex::GraphCore;
use serde_json::Map;
use std::collections::BTreeSet;
use std::sync::Arc;

fn graph() -> GraphCore {
    let (bus, _rx) = EventBus::new(100);
    GraphCore::new(Arc::new(MemoryStore::new()), bus, Config::default())
}

/// A small star-plus-chain graph: hub -> a -> b, hub -> c, a -> d.
async fn star_graph(g: &GraphCore, cancel: &CancelSignal) {
    for id in ["hub", "a", "b", "c", "d"] {
        g.create_node(id, "Node", vec![], Map::new(), cancel).await.unwrap();
    }
    g.create_link("hub", "a", "REL", Map::new(), cancel).await.unwrap();
    g.create_link("hub", "c", "REL", Map::new(), cancel).await.unwrap();
    g.create_link("a", "b", "REL", Map::new(), cancel).await.unwrap();
    g.create_link("a", "d", "OTHER", Map::new(), cancel).await.unwrap();
}

#[tokio::test]
async fn traverse_graph_respects_type_filter() {
    let g = graph();
    let cancel = CancelSignal::inert();
    star_graph(&g, &cancel).await;

    let all = g.traverse_graph("hub", 2, &[], 100, 0, &cancel).await.unwrap();
    let all_set: BTreeSet<_> = all.into_iter().collect();
    assert_eq!(
        all_set,
        BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()])
    );

    let filtered = g
        .traverse_graph("hub", 2, &["REL".to_string()], 100, 0, &cancel)
        .await
        .unwrap();
    let filtered_set: BTreeSet<_> = filtered.into_iter().collect();
    assert_eq!(
        filtered_set,
        BTreeSet::from(["a".to_string(), "c".to_string(), "b".to_string()])
    );
    assert!(!filtered_set.contains("d"));
}

#[tokio::test]
async fn traverse_graph_on_unknown_start_is_not_found() {
    let g = graph();
    let cancel = CancelSignal::inert();
    let err = g.traverse_graph("missing", 1, &[], 10, 0, &cancel).await.unwrap_err();
    assert_eq!(err.kind(), "NOT_FOUND");
}

#[tokio::test]
async fn subgraph_closure_around_a_includes_one_hop_both_directions() {
    let g = graph();
    let cancel = CancelSignal::inert();
    star_graph(&g, &cancel).await;

    let sub = g.get_subgraph(&["a".to_string()], 1, &[], &cancel).await.unwrap();
    let ids: BTreeSet<_> = sub.nodes.iter().map(|n| n.id.clone()).collect();
    assert_eq!(
        ids,
        BTreeSet::from(["hub".to_string(), "a".to_string(), "b".to_string(), "d".to_string()])
    );
    // "c" is two hops from "a" via hub and must not appear.
    assert!(!ids.contains("c"));

    // Every link should have both endpoints inside the closure: hub-a, a-b, a-d.
    assert_eq!(sub.links.len(), 3);
    for link in &sub.links {
        assert!(ids.contains(&link.source_id));
        assert!(ids.contains(&link.target_id));
    }
}

#[tokio::test]
async fn subgraph_with_multiple_seeds_unions_their_closures() {
    let g = graph();
    let cancel = CancelSignal::inert();
    star_graph(&g, &cancel).await;

    let sub = g
        .get_subgraph(&["b".to_string(), "c".to_string()], 1, &[], &cancel)
        .await
        .unwrap();
    let ids: BTreeSet<_> = sub.nodes.iter().map(|n| n.id.clone()).collect();
    assert_eq!(
        ids,
        BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string(), "hub".to_string()])
    );
}

#[tokio::test]
async fn subgraph_rel_type_filter_narrows_hops_and_returned_links() {
    let g = graph();
    let cancel = CancelSignal::inert();
    star_graph(&g, &cancel).await;

    let sub = g
        .get_subgraph(&["a".to_string()], 1, &["REL".to_string()], &cancel)
        .await
        .unwrap();
    let ids: BTreeSet<_> = sub.nodes.iter().map(|n| n.id.clone()).collect();
    // "d" is only reachable via the OTHER-typed link, so it's excluded entirely.
    assert_eq!(
        ids,
        BTreeSet::from(["hub".to_string(), "a".to_string(), "b".to_string()])
    );
    assert!(sub.links.iter().all(|l| l.link_type == "REL"));
}
