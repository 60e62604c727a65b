//! End-to-end coverage of the version-chain worked example (§8): create,
//! update twice, and confirm history, current-version, and time-travel
//! reads all agree.

use memex::cancel::CancelSignal;
use memex::config::Config;
use memex::events::EventBus;
use memex::storage::memory::MemoryStore;
use memex::GraphCore;
use serde_json::{json, Map};
use std::sync::Arc;

fn graph() -> GraphCore {
    let (bus, _rx) = EventBus::new(100);
    GraphCore::new(Arc::new(MemoryStore::new()), bus, Config::default())
}

#[tokio::test]
async fn three_versions_chain_correctly() {
    let g = graph();
    let cancel = CancelSignal::inert();

    let mut props = Map::new();
    props.insert("status".into(), json!("draft"));
    let v1 = g
        .create_node("doc:1", "Document", vec![], props, &cancel)
        .await
        .unwrap();
    assert_eq!(v1.version, 1);
    assert!(v1.is_current);

    let mut delta = Map::new();
    delta.insert("status".into(), json!("reviewed"));
    let v2 = g
        .update_node_meta("doc:1", delta, Some("moved to review".into()), Some("alice".into()), false, &cancel)
        .await
        .unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(v2.change_note.as_deref(), Some("moved to review"));

    let mut delta = Map::new();
    delta.insert("status".into(), json!("published"));
    let v3 = g
        .update_node_meta("doc:1", delta, None, Some("bob".into()), false, &cancel)
        .await
        .unwrap();
    assert_eq!(v3.version, 3);

    let current = g.get_node("doc:1").await.unwrap();
    assert_eq!(current.version, 3);
    assert_eq!(current.properties["status"], json!("published"));

    let history = g.get_node_history("doc:1").await.unwrap();
    assert_eq!(
        history.iter().map(|n| n.version).collect::<Vec<_>>(),
        vec![3, 2, 1]
    );

    let v1_again = g.get_node_at_version("doc:1", 1).await.unwrap();
    assert_eq!(v1_again.properties["status"], json!("draft"));

    let at_v2_time = g.get_node_at_time("doc:1", v2.modified_at).await.unwrap();
    assert_eq!(at_v2_time.version, 2);
}

#[tokio::test]
async fn get_node_history_on_unknown_id_is_not_found() {
    let g = graph();
    let err = g.get_node_history("missing").await.unwrap_err();
    assert_eq!(err.kind(), "NOT_FOUND");
}

#[tokio::test]
async fn update_node_meta_on_unknown_id_is_not_found() {
    let g = graph();
    let cancel = CancelSignal::inert();
    let err = g
        .update_node_meta("missing", Map::new(), None, None, false, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "NOT_FOUND");
}
