use super::graphdb::GraphCore;
use crate::cancel::CancelSignal;
use crate::error::Result;
use crate::model::{Link, Node};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// The undirected closure of a seed set plus every link between two
/// included nodes (§4.2, "Subgraph closure"; worked example in §8).
pub struct Subgraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl GraphCore {
    /// `TraverseGraph(start, max_depth, type_filter)` (§4.2): breadth-first
    /// over outgoing links only, depth-bounded, cycle-safe via a visited
    /// set, returning ids in discovery order.
    pub async fn traverse_graph(
        &self,
        start: &str,
        max_depth: u32,
        type_filter: &[String],
        limit: usize,
        offset: usize,
        cancel: &CancelSignal,
    ) -> Result<Vec<String>> {
        cancel.check()?;
        self.require_current(start).await?;
        self.storage
            .traverse_outgoing(start, max_depth, type_filter, limit, offset)
            .await
    }

    /// `GetSubgraph(start, depth, relTypes)` (§4.2): expands the seed set
    /// along links in *either* direction up to `depth` hops — restricted to
    /// `type ∈ relTypes` when non-empty, the same way `relTypes` narrows
    /// `TraverseGraph` — then returns every node in the closure together
    /// with every link whose two endpoints both lie in the closure and
    /// whose type matches the filter (so edges leaving the frontier's last
    /// hop are excluded, matching the worked example in §8).
    pub async fn get_subgraph(
        &self,
        seeds: &[String],
        depth: u32,
        rel_types: &[String],
        cancel: &CancelSignal,
    ) -> Result<Subgraph> {
        cancel.check()?;
        let type_matches = |t: &str| rel_types.is_empty() || rel_types.iter().any(|rt| rt == t);

        let mut visited: FxHashSet<String> = FxHashSet::default();
        let mut frontier: VecDeque<(String, u32)> = VecDeque::new();
        for seed in seeds {
            self.require_current(seed).await?;
            if visited.insert(seed.clone()) {
                frontier.push_back((seed.clone(), 0));
            }
        }

        while let Some((id, dist)) = frontier.pop_front() {
            if dist >= depth {
                continue;
            }
            cancel.check()?;
            let mut neighbours: Vec<String> = self
                .storage
                .get_links_from_source(&id)
                .await?
                .into_iter()
                .filter(|l| type_matches(&l.link_type))
                .map(|l| l.target_id)
                .collect();
            neighbours.extend(
                self.storage
                    .get_links_to_target(&id)
                    .await?
                    .into_iter()
                    .filter(|l| type_matches(&l.link_type))
                    .map(|l| l.source_id),
            );
            for n in neighbours {
                if visited.insert(n.clone()) {
                    frontier.push_back((n, dist + 1));
                }
            }
        }

        let mut nodes = Vec::with_capacity(visited.len());
        for id in &visited {
            if let Some(node) = self.storage.get_node_current(id).await? {
                if !node.deleted {
                    nodes.push(node);
                }
            }
        }

        let mut links = Vec::new();
        for id in &visited {
            for link in self.storage.get_links_from_source(id).await? {
                if visited.contains(&link.target_id) && type_matches(&link.link_type) {
                    links.push(link);
                }
            }
        }

        Ok(Subgraph { nodes, links })
    }
}
