//! Attention-edge learning (§4.3): running-average weight updates and
//! threshold-based pruning.

use memex::cancel::CancelSignal;
use memex::config::Config;
use memex::events::EventBus;
use memex::model::AttentionFields;
use memex::storage::memory::MemoryStore;
use memex::GraphCore;
use serde_json::Map;
use std::sync::Arc;

fn graph() -> GraphCore {
    let (bus, _rx) = EventBus::new(100);
    GraphCore::new(Arc::new(MemoryStore::new()), bus, Config::default())
}

async fn seed_nodes(g: &GraphCore, cancel: &CancelSignal, ids: &[&str]) {
    for id in ids {
        g.create_node(*id, "Concept", vec![], Map::new(), cancel).await.unwrap();
    }
}

#[tokio::test]
async fn weight_is_a_running_average_across_three_updates() {
    let g = graph();
    let cancel = CancelSignal::inert();
    seed_nodes(&g, &cancel, &["q1", "t1"]).await;

    g.update_attention_edge("q1", "t1", "query-a", 1.0, &cancel).await.unwrap();
    g.update_attention_edge("q1", "t1", "query-b", 0.5, &cancel).await.unwrap();
    let link = g
        .update_attention_edge("q1", "t1", "query-c", 0.0, &cancel)
        .await
        .unwrap();

    let fields = AttentionFields::read_from(&link.properties).unwrap();
    assert_eq!(fields.query_count, 3);
    assert!((fields.weight - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn rejects_out_of_range_weight_samples() {
    let g = graph();
    let cancel = CancelSignal::inert();
    seed_nodes(&g, &cancel, &["q1", "t1"]).await;

    let err = g
        .update_attention_edge("q1", "t1", "query-a", 1.5, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "INVALID_ARGUMENT");
}

#[tokio::test]
async fn attention_subgraph_excludes_structural_only_edges() {
    let g = graph();
    let cancel = CancelSignal::inert();
    seed_nodes(&g, &cancel, &["q1", "t1", "t2"]).await;

    g.create_link("q1", "t1", "RELATED_TO", Map::new(), &cancel).await.unwrap();
    g.update_attention_edge("q1", "t2", "query-a", 0.9, &cancel).await.unwrap();

    let attended = g
        .get_attention_subgraph("q1", 0.0, 10, &cancel)
        .await
        .unwrap();
    assert!(attended.links.iter().all(|l| l.is_attention_edge()));
    assert_eq!(attended.links.len(), 1);
    assert_eq!(attended.links[0].target_id, "t2");
}

#[tokio::test]
async fn attention_subgraph_respects_min_weight_and_max_nodes() {
    let g = graph();
    let cancel = CancelSignal::inert();
    seed_nodes(&g, &cancel, &["q1", "weak", "strong"]).await;

    g.update_attention_edge("q1", "weak", "query-a", 0.1, &cancel).await.unwrap();
    g.update_attention_edge("q1", "strong", "query-a", 0.9, &cancel).await.unwrap();

    let sub = g
        .get_attention_subgraph("q1", 0.5, 10, &cancel)
        .await
        .unwrap();
    let ids: std::collections::BTreeSet<_> = sub.nodes.iter().map(|n| n.id.clone()).collect();
    assert!(ids.contains("strong"));
    assert!(!ids.contains("weak"));

    // maxNodes=1 caps the closure to the seed alone (no neighbours admitted).
    let capped = g
        .get_attention_subgraph("q1", 0.0, 1, &cancel)
        .await
        .unwrap();
    assert_eq!(capped.nodes.len(), 1);
    assert_eq!(capped.nodes[0].id, "q1");
}

#[tokio::test]
async fn prune_removes_edges_below_either_threshold() {
    let g = graph();
    let cancel = CancelSignal::inert();
    seed_nodes(&g, &cancel, &["q1", "weak", "strong"]).await;

    // Weak: low weight, low query count -- should be pruned.
    g.update_attention_edge("q1", "weak", "query-a", 0.02, &cancel).await.unwrap();
    // Strong: high weight and enough observations -- survives.
    g.update_attention_edge("q1", "strong", "query-a", 0.95, &cancel).await.unwrap();
    g.update_attention_edge("q1", "strong", "query-b", 0.9, &cancel).await.unwrap();

    let removed = g.prune_weak_attention_edges(0.1, 2, &cancel).await.unwrap();
    assert_eq!(removed, 1);

    let remaining = g.get_links("q1", "out").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].target_id, "strong");
}

#[tokio::test]
async fn prune_removes_edge_with_high_weight_but_too_few_queries() {
    let g = graph();
    let cancel = CancelSignal::inert();
    seed_nodes(&g, &cancel, &["q1", "new"]).await;

    g.update_attention_edge("q1", "new", "query-a", 0.99, &cancel).await.unwrap();

    // query_count=1 < min_query_count=2, so the OR condition prunes it even
    // though the weight is well above min_weight.
    let removed = g.prune_weak_attention_edges(0.1, 2, &cancel).await.unwrap();
    assert_eq!(removed, 1);
}
