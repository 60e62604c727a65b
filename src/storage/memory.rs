//! An in-process reference [`StorageDriver`](super::StorageDriver).
//!
//! Not the "concrete storage driver" the specification places out of scope
//! (§1) — this exists so the graph core, attention engine, and subscription
//! matcher are runnable and testable in this repository. A production
//! deployment supplies its own driver (embedded B-tree/relational, or
//! remote labelled-property) against the same trait. Internals follow the
//! reference crate's habit of guarding a plain `BTreeMap`-based model with a
//! single `parking_lot::RwLock` (see the reference crate's `model.rs`,
//! which stores node/edge properties in `BTreeMap<String, PropertyValue>`).

use super::{ChainEntry, QueryOutcome, SearchOutcome, StorageDriver};
use crate::error::{GraphError, Result};
use crate::model::Link;
use crate::model::Node;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

type LinkKey = (String, String, String);

#[derive(Default)]
struct Inner {
    /// version_id -> node version row.
    versions: BTreeMap<String, Node>,
    /// id -> current version number; absent once hard-deleted.
    current: BTreeMap<String, u64>,
    /// id -> version numbers created, ascending.
    history: BTreeMap<String, Vec<u64>>,
    chain: Vec<ChainEntry>,
    links: BTreeMap<LinkKey, Link>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_degree(inner: &mut Inner, id: &str, delta: i64) {
        let Some(&version) = inner.current.get(id) else {
            return;
        };
        let version_id = crate::identity::version_id(id, version);
        if let Some(node) = inner.versions.get_mut(&version_id) {
            node.degree = node.degree.saturating_add_signed(delta);
        }
    }
}

#[async_trait]
impl StorageDriver for MemoryStore {
    async fn create_node(&self, node: Node) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.current.contains_key(&node.id) || inner.history.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id.clone()));
        }
        let id = node.id.clone();
        let version = node.version;
        let version_id = node.version_id.clone();
        inner.versions.insert(version_id, node);
        inner.current.insert(id.clone(), version);
        inner.history.insert(id, vec![version]);
        Ok(())
    }

    async fn get_node_current(&self, id: &str) -> Result<Option<Node>> {
        let inner = self.inner.read();
        let Some(&version) = inner.current.get(id) else {
            return Ok(None);
        };
        let version_id = crate::identity::version_id(id, version);
        Ok(inner.versions.get(&version_id).cloned())
    }

    async fn get_node_by_version(&self, id: &str, version: u64) -> Result<Option<Node>> {
        let inner = self.inner.read();
        let version_id = crate::identity::version_id(id, version);
        Ok(inner.versions.get(&version_id).cloned())
    }

    async fn get_node_at_time(&self, id: &str, at: OffsetDateTime) -> Result<Option<Node>> {
        let inner = self.inner.read();
        let Some(versions) = inner.history.get(id) else {
            return Ok(None);
        };
        let mut best: Option<&Node> = None;
        for &v in versions {
            let version_id = crate::identity::version_id(id, v);
            if let Some(node) = inner.versions.get(&version_id) {
                if node.modified_at <= at {
                    if best.map(|b| b.version < node.version).unwrap_or(true) {
                        best = Some(node);
                    }
                }
            }
        }
        Ok(best.cloned())
    }

    async fn list_versions_of(&self, id: &str) -> Result<Vec<Node>> {
        let inner = self.inner.read();
        let Some(versions) = inner.history.get(id) else {
            return Ok(Vec::new());
        };
        let mut nodes: Vec<Node> = versions
            .iter()
            .filter_map(|&v| inner.versions.get(&crate::identity::version_id(id, v)).cloned())
            .collect();
        nodes.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(nodes)
    }

    async fn get_version_chain(&self, id: &str) -> Result<Vec<ChainEntry>> {
        let inner = self.inner.read();
        Ok(inner
            .chain
            .iter()
            .filter(|e| e.newer_version_id.starts_with(&format!("{id}:v")))
            .cloned()
            .collect())
    }

    async fn insert_version(&self, previous_version_id: Option<&str>, new_node: Node) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some(prev_id) = previous_version_id {
            if let Some(prev) = inner.versions.get_mut(prev_id) {
                prev.is_current = false;
            }
            inner.chain.push(ChainEntry {
                newer_version_id: new_node.version_id.clone(),
                older_version_id: prev_id.to_string(),
            });
        }
        let id = new_node.id.clone();
        let version = new_node.version;
        let version_id = new_node.version_id.clone();
        inner.versions.insert(version_id, new_node);
        inner.current.insert(id.clone(), version);
        inner.history.entry(id).or_default().push(version);
        Ok(())
    }

    async fn delete_node_hard(&self, id: &str) -> Result<BTreeMap<String, u64>> {
        let mut inner = self.inner.write();
        let mut removed_per_neighbor: BTreeMap<String, u64> = BTreeMap::new();

        if let Some(versions) = inner.history.remove(id) {
            for v in versions {
                inner.versions.remove(&crate::identity::version_id(id, v));
            }
        }
        inner.current.remove(id);
        inner.chain.retain(|e| {
            !e.newer_version_id.starts_with(&format!("{id}:v"))
                && !e.older_version_id.starts_with(&format!("{id}:v"))
        });

        let doomed: Vec<LinkKey> = inner
            .links
            .keys()
            .filter(|(s, t, _)| s == id || t == id)
            .cloned()
            .collect();

        for key in doomed {
            inner.links.remove(&key);
            let neighbor = if key.0 == id { key.1.clone() } else { key.0.clone() };
            *removed_per_neighbor.entry(neighbor.clone()).or_insert(0) += 1;
        }

        for (neighbor, count) in &removed_per_neighbor {
            Self::bump_degree(&mut inner, neighbor, -(*count as i64));
        }

        Ok(removed_per_neighbor)
    }

    async fn create_link(&self, link: Link) -> Result<()> {
        let mut inner = self.inner.write();
        let key = (
            link.source_id.clone(),
            link.target_id.clone(),
            link.link_type.clone(),
        );
        if inner.links.contains_key(&key) {
            return Err(GraphError::DuplicateLink(
                link.source_id.clone(),
                link.target_id.clone(),
                link.link_type.clone(),
            ));
        }
        inner.links.insert(key, link.clone());
        Self::bump_degree(&mut inner, &link.source_id, 1);
        Self::bump_degree(&mut inner, &link.target_id, 1);
        Ok(())
    }

    async fn delete_link(&self, source: &str, target: &str, link_type: &str) -> Result<bool> {
        let mut inner = self.inner.write();
        let key = (source.to_string(), target.to_string(), link_type.to_string());
        if inner.links.remove(&key).is_some() {
            Self::bump_degree(&mut inner, source, -1);
            Self::bump_degree(&mut inner, target, -1);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn get_links_from_source(&self, id: &str) -> Result<Vec<Link>> {
        let inner = self.inner.read();
        Ok(inner
            .links
            .values()
            .filter(|l| l.source_id == id)
            .cloned()
            .collect())
    }

    async fn get_links_to_target(&self, id: &str) -> Result<Vec<Link>> {
        let inner = self.inner.read();
        Ok(inner
            .links
            .values()
            .filter(|l| l.target_id == id)
            .cloned()
            .collect())
    }

    async fn list_all_links(&self) -> Result<Vec<Link>> {
        let inner = self.inner.read();
        Ok(inner.links.values().cloned().collect())
    }

    async fn delete_links(&self, keys: &[(String, String, String)]) -> Result<u64> {
        let mut inner = self.inner.write();
        let mut removed = 0u64;
        for key in keys {
            if inner.links.remove(key).is_some() {
                Self::bump_degree(&mut inner, &key.0, -1);
                Self::bump_degree(&mut inner, &key.1, -1);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn update_link_properties(
        &self,
        source: &str,
        target: &str,
        link_type: &str,
        new_properties: serde_json::Map<String, Value>,
        now: OffsetDateTime,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let key = (source.to_string(), target.to_string(), link_type.to_string());
        match inner.links.get_mut(&key) {
            Some(link) => {
                link.properties = new_properties;
                link.modified_at = now;
                Ok(())
            }
            None => Err(GraphError::NotFound(format!(
                "link {source} -[{link_type}]-> {target}"
            ))),
        }
    }

    async fn list_node_ids(&self) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut ids = Vec::new();
        for (id, &version) in &inner.current {
            let version_id = crate::identity::version_id(id, version);
            if let Some(node) = inner.versions.get(&version_id) {
                if !node.deleted {
                    ids.push(id.clone());
                }
            }
        }
        Ok(ids)
    }

    async fn search_by_text(&self, query: &str, limit: usize, offset: usize) -> Result<SearchOutcome> {
        // The in-memory reference driver has no tokenised FTS index; it
        // always reports `Unsupported` so callers exercise the documented
        // substring fallback path (§4.2, "Full-text behaviour").
        let _ = (query, limit, offset);
        Ok(SearchOutcome::Unsupported)
    }

    async fn filter_by_type_and_property_substring(
        &self,
        types: &[String],
        substring: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let type_set: BTreeSet<&str> = types.iter().map(String::as_str).collect();
        let mut matches = Vec::new();
        for (id, &version) in &inner.current {
            let version_id = crate::identity::version_id(id, version);
            let Some(node) = inner.versions.get(&version_id) else {
                continue;
            };
            if node.deleted {
                continue;
            }
            if !type_set.is_empty() && !type_set.contains(node.node_type.as_str()) {
                continue;
            }
            if let Some(needle) = substring {
                let serialized = serde_json::to_string(&node.properties).unwrap_or_default();
                if !serialized.contains(needle) {
                    continue;
                }
            }
            matches.push(id.clone());
        }
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    async fn traverse_outgoing(
        &self,
        start: &str,
        max_depth: u32,
        type_filter: &[String],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let type_set: BTreeSet<&str> = type_filter.iter().map(String::as_str).collect();

        let mut visited: BTreeSet<String> = BTreeSet::new();
        visited.insert(start.to_string());
        let mut frontier = vec![start.to_string()];

        for _ in 0..max_depth {
            let mut next_frontier = Vec::new();
            for id in &frontier {
                for link in inner.links.values().filter(|l| &l.source_id == id) {
                    if !type_set.is_empty() && !type_set.contains(link.link_type.as_str()) {
                        continue;
                    }
                    let version = match inner.current.get(&link.target_id) {
                        Some(v) => *v,
                        None => continue,
                    };
                    let version_id = crate::identity::version_id(&link.target_id, version);
                    let Some(node) = inner.versions.get(&version_id) else {
                        continue;
                    };
                    if node.deleted {
                        continue;
                    }
                    if visited.insert(link.target_id.clone()) {
                        next_frontier.push(link.target_id.clone());
                    }
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        visited.remove(start);
        let mut ids: Vec<String> = visited.into_iter().collect();
        ids.sort();
        Ok(ids.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_nodes_grouped_by_type(&self) -> Result<BTreeMap<String, u64>> {
        let inner = self.inner.read();
        let mut counts = BTreeMap::new();
        for (id, &version) in &inner.current {
            let version_id = crate::identity::version_id(id, version);
            if let Some(node) = inner.versions.get(&version_id) {
                if !node.deleted {
                    *counts.entry(node.node_type.clone()).or_insert(0) += 1;
                }
            }
        }
        Ok(counts)
    }

    async fn count_links_grouped_by_type(&self) -> Result<BTreeMap<String, u64>> {
        let inner = self.inner.read();
        let mut counts = BTreeMap::new();
        for link in inner.links.values() {
            *counts.entry(link.link_type.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn top_nodes_by_degree(&self, n: usize) -> Result<Vec<(String, u64)>> {
        let inner = self.inner.read();
        let mut degrees: Vec<(String, u64)> = Vec::new();
        for (id, &version) in &inner.current {
            let version_id = crate::identity::version_id(id, version);
            if let Some(node) = inner.versions.get(&version_id) {
                if !node.deleted {
                    degrees.push((id.clone(), node.degree));
                }
            }
        }
        degrees.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        degrees.truncate(n);
        Ok(degrees)
    }

    async fn sample_ids_by_type(&self, node_type: &str, n: usize) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut ids = Vec::new();
        for (id, &version) in &inner.current {
            if ids.len() >= n {
                break;
            }
            let version_id = crate::identity::version_id(id, version);
            if let Some(node) = inner.versions.get(&version_id) {
                if !node.deleted && node.node_type == node_type {
                    ids.push(id.clone());
                }
            }
        }
        Ok(ids)
    }

    async fn execute_read_only_query(
        &self,
        text: &str,
        _params: BTreeMap<String, Value>,
    ) -> Result<QueryOutcome> {
        // No ad-hoc read-query engine in the reference driver.
        let _ = text;
        Ok(QueryOutcome::Unsupported)
    }

    fn supports_read_only_queries(&self) -> bool {
        false
    }
}
