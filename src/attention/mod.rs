//! Attention-edge learning (§4.3): the graph's record of which targets a
//! query actually found useful, expressed as `ATTENDED` links whose
//! `weight`/`query_count` properties update as a running average rather
//! than a plain overwrite.

use crate::cancel::CancelSignal;
use crate::error::{GraphError, Result};
use crate::graph::{GraphCore, Subgraph};
use crate::model::{AttentionFields, Link, Node, ATTENDED};
use std::collections::VecDeque;
use time::OffsetDateTime;

impl GraphCore {
    /// `UpdateAttentionEdge(source, target, query_id, w)` (§4.3): reads the
    /// current `ATTENDED` edge (if any), folds `w` into its running
    /// average, and writes it back. Serialized per `(source, target)` via
    /// [`GraphCore::attention_lock`] so concurrent updates to the same edge
    /// cannot race the read-modify-write (§5).
    pub async fn update_attention_edge(
        &self,
        source_id: &str,
        target_id: &str,
        query_id: &str,
        weight_sample: f64,
        cancel: &CancelSignal,
    ) -> Result<Link> {
        cancel.check()?;
        if !(0.0..=1.0).contains(&weight_sample) {
            return Err(GraphError::InvalidArgument(
                "attention weight sample must be in [0.0, 1.0]".into(),
            ));
        }
        self.require_current(source_id).await?;
        self.require_current(target_id).await?;

        let key = (source_id.to_string(), target_id.to_string(), ATTENDED.to_string());
        let lock = self.attention_lock(&key);
        let _guard = lock.lock().await;

        let existing = self
            .storage
            .get_links_from_source(source_id)
            .await?
            .into_iter()
            .find(|l| l.target_id == target_id && l.link_type == ATTENDED);

        let now = OffsetDateTime::now_utc();
        let updated = match existing {
            Some(mut link) => {
                let fields = AttentionFields::read_from(&link.properties).unwrap_or(AttentionFields {
                    weight: 0.0,
                    query_count: 0,
                });
                let merged = AttentionFields {
                    weight: (fields.weight * fields.query_count as f64 + weight_sample)
                        / (fields.query_count as f64 + 1.0),
                    query_count: fields.query_count + 1,
                };
                merged.write_into(&mut link.properties, query_id, now);
                self.storage
                    .update_link_properties(source_id, target_id, ATTENDED, link.properties.clone(), now)
                    .await?;
                link.modified_at = now;
                link
            }
            None => {
                let mut properties = serde_json::Map::new();
                let fields = AttentionFields {
                    weight: weight_sample,
                    query_count: 1,
                };
                fields.write_into(&mut properties, query_id, now);
                let link = Link::new(source_id, target_id, ATTENDED, properties, now);
                self.storage.create_link(link.clone()).await?;
                link
            }
        };

        Ok(updated)
    }

    /// `GetAttentionSubgraph(start, minWeight, maxNodes)` (§4.3): breadth-
    /// first over `ATTENDED` links only (either direction), collecting up
    /// to `max_nodes` neighbours whose edge weight is `≥ min_weight`, then
    /// returning every `ATTENDED` link whose two endpoints both lie in the
    /// returned node set — so callers recover "what has actually proven
    /// useful near this node" rather than the full structural
    /// neighbourhood.
    pub async fn get_attention_subgraph(
        &self,
        start: &str,
        min_weight: f64,
        max_nodes: usize,
        cancel: &CancelSignal,
    ) -> Result<Subgraph> {
        cancel.check()?;
        self.require_current(start).await?;
        let start_node = self
            .storage
            .get_node_current(start)
            .await?
            .ok_or_else(|| GraphError::NotFound(start.to_string()))?;

        let mut included: Vec<Node> = vec![start_node];
        let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
        seen.insert(start.to_string());
        let mut frontier: VecDeque<String> = VecDeque::from([start.to_string()]);

        while let Some(id) = frontier.pop_front() {
            if included.len() >= max_nodes {
                break;
            }
            cancel.check()?;
            let mut neighbours: Vec<(String, AttentionFields)> = Vec::new();
            for l in self.storage.get_links_from_source(&id).await? {
                if l.is_attention_edge() {
                    if let Some(fields) = AttentionFields::read_from(&l.properties) {
                        neighbours.push((l.target_id, fields));
                    }
                }
            }
            for l in self.storage.get_links_to_target(&id).await? {
                if l.is_attention_edge() {
                    if let Some(fields) = AttentionFields::read_from(&l.properties) {
                        neighbours.push((l.source_id, fields));
                    }
                }
            }

            for (neighbour_id, fields) in neighbours {
                if included.len() >= max_nodes {
                    break;
                }
                if fields.weight < min_weight || seen.contains(&neighbour_id) {
                    continue;
                }
                seen.insert(neighbour_id.clone());
                if let Some(node) = self.storage.get_node_current(&neighbour_id).await? {
                    if !node.deleted {
                        included.push(node);
                        frontier.push_back(neighbour_id);
                    }
                }
            }
        }

        let node_ids: std::collections::HashSet<String> =
            included.iter().map(|n| n.id.clone()).collect();

        let mut links = Vec::new();
        for id in &node_ids {
            for link in self.storage.get_links_from_source(id).await? {
                if link.is_attention_edge() && node_ids.contains(&link.target_id) {
                    links.push(link);
                }
            }
        }

        Ok(Subgraph {
            nodes: included,
            links,
        })
    }

    /// `PruneWeakAttentionEdges(minWeight, minQueryCount)` (§4.3): removes
    /// every `ATTENDED` edge whose `weight` falls below `min_weight` *or*
    /// whose `query_count` falls below `min_query_count`, returning the
    /// number removed. Runs against a single snapshot read of all links, so
    /// a compensating run re-evaluates any edge updated mid-scan (§4.3).
    pub async fn prune_weak_attention_edges(
        &self,
        min_weight: f64,
        min_query_count: u64,
        cancel: &CancelSignal,
    ) -> Result<u64> {
        cancel.check()?;

        let doomed: Vec<(String, String, String)> = self
            .storage
            .list_all_links()
            .await?
            .into_iter()
            .filter(|l| l.is_attention_edge())
            .filter_map(|l| {
                let fields = AttentionFields::read_from(&l.properties)?;
                if fields.weight < min_weight || fields.query_count < min_query_count {
                    Some(l.key_owned())
                } else {
                    None
                }
            })
            .collect();

        if doomed.is_empty() {
            return Ok(0);
        }
        self.storage.delete_links(&doomed).await
    }
}
